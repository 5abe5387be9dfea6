//! Auth0 JWT verification for actix-web services.
//!
//! The crate covers the thin slice of Auth0 most APIs need:
//!
//! - fetching and caching the tenant's JWKS document ([`JwksCache`]),
//! - verifying RS256 bearer tokens against it ([`validate_token`]),
//! - resolving the authenticated principal from a configurable claim
//!   ([`authenticate`], [`AuthenticatedUser`]).
//!
//! A small [`ManagementApi`] client is included for the two management
//! calls that usually accompany token verification: obtaining a
//! machine-to-machine token and fetching a user's profile.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use actix_web::{web, App, HttpServer, Responder};
//! use auth0_guard::{Auth0Config, AuthenticatedUser, JwksCache, JwksResolver};
//!
//! async fn whoami(user: AuthenticatedUser) -> impl Responder {
//!     user.0.username
//! }
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = Auth0Config::from_env().expect("AUTH0_* environment");
//!     config.validate().expect("complete Auth0 settings");
//!     let resolver: Arc<dyn JwksResolver> =
//!         Arc::new(JwksCache::new(&config).expect("JWKS cache"));
//!
//!     HttpServer::new(move || {
//!         App::new()
//!             .app_data(web::Data::new(config.clone()))
//!             .app_data(web::Data::new(resolver.clone()))
//!             .route("/whoami", web::get().to(whoami))
//!     })
//!     .bind(("127.0.0.1", 8080))?
//!     .run()
//!     .await
//! }
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod extract;
pub mod jwks;
pub mod management;
pub mod validate;

pub use claims::{username_from_subject, Audience, Claims, Principal};
pub use config::Auth0Config;
pub use error::{AuthError, AuthResult};
pub use extract::{bearer_token, AuthenticatedUser, PrincipalMapper};
pub use jwks::{Jwk, Jwks, JwksCache, JwksResolver};
pub use management::{
    DisabledManagementClient, HttpManagementClient, ManagementApi, TokenResponse, UserProfile,
};
pub use validate::{authenticate, validate_token};
