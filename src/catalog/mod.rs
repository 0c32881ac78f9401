mod locator;
mod selection;

pub use locator::{CONFIG_PREFIX, ConfigLocator};
pub use selection::{ConfigSelection, Picker};
