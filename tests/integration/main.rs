//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the transmitter against
//! the recording mock transport.  All tests run on the host with no real
//! hardware required.

mod lifecycle_tests;
mod mock_transport;
mod scheduler_tests;
