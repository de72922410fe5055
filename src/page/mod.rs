// Page module - LiveView credential scraping
pub mod credentials;

pub use credentials::{
    CredentialError, CredentialReport, HandshakeCredentials, extract, extract_credentials,
};
