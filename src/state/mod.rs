/// State management module
///
/// This module handles all client-side state, including:
/// - Shared data structures (data.rs)
/// - The durable session store (session.rs)
/// - Fetched preview handles and their release (previews.rs)

pub mod data;
pub mod previews;
pub mod session;
