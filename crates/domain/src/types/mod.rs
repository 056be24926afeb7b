//! Domain types and models

pub mod auth;
pub mod request;
pub mod response;

pub use auth::{
    AdminCredentials, AdminLoginOutcome, AdminLoginRequest, AdminLoginResponse,
    AdminTwoFactorRequest, PlayerCredentials, PlayerSessionRequest, PlayerSessionResponse,
};
pub use request::{
    BinaryUpload, CredentialDomain, HttpMethod, RequestBody, RequestDescriptor,
    RequestDescriptorBuilder, ResolvedRequest,
};
pub use response::{ApiErrorBody, FailureKind, ResponseEnvelope, TerminalReason};
