pub use anyhow::{anyhow, bail, ensure};
