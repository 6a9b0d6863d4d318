pub mod ledger;
pub mod server;
