pub mod seller;

pub use seller::{SellerContext, SELLER_ID_HEADER};
