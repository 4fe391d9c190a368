pub mod locators;
pub mod page;
pub mod selector;
pub mod test_unit;
pub mod translate;

pub use locators::{build_table, build_table_from_source, LocatorTable, Overwrite};
pub use page::{build_page_module, convert_page, PageConversion, PageModule};
pub use selector::{render, resolve};
pub use test_unit::{
    build_test_script, convert_test, PageCatalog, TestConversion, TestScript, TEST_DETECTORS,
};
pub use translate::{translate, PageDetector, PAGE_DETECTORS};
