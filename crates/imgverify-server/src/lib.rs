//! HTTP front end for the image verification pipeline.
//!
//! | Route | Response |
//! |-------|----------|
//! | `POST /verify` | `200` JSON verdict, `400` bad request or image, `500` misconfiguration |
//! | `GET /healthz` | `200 ok` |

pub mod cli;
pub mod http;
pub mod logging;

pub use cli::Cli;
pub use http::router;
pub use logging::LogFormat;
