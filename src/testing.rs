//! Test support for hosts that marshal their own record types.
//!
//! - **Fixtures**: sample record types with matching delimited and
//!   fixed-width content
//! - **Assertions**: record comparison, codec round trips and error checks
//! - **Mock I/O**: temporary files and directories that clean up on drop
//!
//! ```
//! use ironflat::io::DelimitedCodec;
//! use ironflat::marshal::Marshaller;
//! use ironflat::testing::*;
//!
//! let marshaller = Marshaller::new();
//! assert_round_trip(&marshaller, &DelimitedCodec::default(), &sample_trades());
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock_io;

pub use assertions::*;
pub use fixtures::*;
pub use mock_io::*;
