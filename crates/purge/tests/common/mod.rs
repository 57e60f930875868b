pub mod fake;

#[allow(unused_imports)]
pub use fake::{FakeConnector, FakeCoreService, FakeState, batch, metadata_blob, session, transaction};
