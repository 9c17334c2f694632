/// Common interface for all storage solutions.
mod concepts;

/// Save elements as ron files via [ron].
mod ron;

/// Save elements as json files via [serde_json].
mod serde_json;

pub use self::concepts::*;
pub use self::ron::*;
pub use self::serde_json::*;
