pub(crate) mod dns_account;
pub(crate) mod domain;
pub(crate) mod server;
