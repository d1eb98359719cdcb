//! Cross-crate tests: end-to-end loading scenarios, position mapping,
//! inheritance and registry behavior.

#[cfg(test)]
mod support;

#[cfg(test)]
mod cancellation;
#[cfg(test)]
mod filesystem_loading;
#[cfg(test)]
mod inheritance;
#[cfg(test)]
mod memory_loading;
#[cfg(test)]
mod navigation;
#[cfg(test)]
mod positions;
