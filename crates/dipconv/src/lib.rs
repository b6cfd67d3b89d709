#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use dipconv_image as image;

#[doc(inline)]
pub use dipconv_linear as linear;
