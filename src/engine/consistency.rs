use crate::domain::MatchRecord;
use crate::errors::{ConsistencyWarning, WarningKind};
use crate::rating::types::PlayerId;

/// One warning per participant of `record` listed in `later_players`, in slot
/// order. `later_players` are the participants who already have a match that
/// sorts after `record`; for them an incremental apply or reversal of `record`
/// disagrees with a chronological replay.
pub fn out_of_order_warnings(
    record: &MatchRecord,
    later_players: &[PlayerId],
    kind: WarningKind,
) -> Vec<ConsistencyWarning> {
    record
        .slots
        .iter()
        .filter(|slot| later_players.contains(&slot.player_id))
        .map(|slot| ConsistencyWarning {
            match_id: record.id,
            player_id: slot.player_id,
            kind,
        })
        .collect()
}
