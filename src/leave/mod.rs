pub mod calendar;
pub mod conflict;
pub mod ledger;
pub mod mysql_store;
pub mod notify;
pub mod policy;
pub mod report;
pub mod router;
pub mod store;
pub mod validator;
pub mod workflow;

#[cfg(test)]
pub mod testing;
