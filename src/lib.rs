//! Bearer-token lifecycle core for cloud-service authenticators: JWT-aware expiry policies,
//! single-flight fetches, and non-blocking refresh-ahead in one crate.
//!
//! Each authenticator supplies a [`fetch::TokenFetcher`] that knows how to talk to its token
//! service. The [`cache::TokenCache`] wraps it, hands out cached bearer tokens, performs at most
//! one synchronous fetch when no usable token exists, and refreshes tokens in the background
//! once they cross their refresh window.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod endpoint;
pub mod error;
pub mod fetch;
#[cfg(feature = "reqwest")] pub mod http;
pub mod jwt;
pub mod obs;
pub mod sign;
pub mod token;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use cache::{TokenCache, TokenCacheConfig};
pub use error::{Error, Result};
pub use fetch::TokenFetcher;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
pub use token::{Token, TokenSecret};
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
