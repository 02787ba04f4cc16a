//! 反向代理与证书
//!
//! For providers without edge TLS the certificate comes from Caddy, which
//! needs a site entry per domain. [`probe_certificate`] checks what is
//! actually served.

mod caddy;
mod probe;

pub use caddy::CaddyCertificateManager;
pub use probe::probe_certificate;
