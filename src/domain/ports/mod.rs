mod handle_port;
mod image_fetch_port;
mod url_normalizer_port;

pub use handle_port::HandlePort;
#[cfg(test)]
pub use image_fetch_port::MockImageFetchPort;
pub use image_fetch_port::ImageFetchPort;
pub use url_normalizer_port::UrlNormalizerPort;

#[cfg(test)]
pub mod mocks {
    pub use super::handle_port::mock::{CountingHandles, TestHandle};
    pub use super::image_fetch_port::mock::ScriptedFetcher;
}
