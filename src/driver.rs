use crate::convert::{convert_page, convert_test, PageCatalog};
use crate::core::MigrationConfig;
use crate::errors::{MigrationError, Result};
use crate::manifest::ConversionManifest;
use crate::types::UnitKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Walks the input tree and converts every page and test source into the
/// output tree. A failing file never stops the run.
pub struct MigrationDriver {
    config: MigrationConfig,
}

impl MigrationDriver {
    pub fn new(config: MigrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn run(&self) -> ConversionManifest {
        let mut manifest = ConversionManifest::new();
        info!(
            "Starting conversion run {} from {}",
            manifest.run_id,
            self.config.paths.input_root.display()
        );

        let mut catalog = PageCatalog::new(
            self.config.page_output_dir(),
            self.config.paths.page_package_marker.clone(),
        );
        let test_out = self.config.test_output_dir();

        for path in self.sources(UnitKind::Page, &mut manifest) {
            match convert_page(&path, &catalog.out_dir) {
                Ok(page) => {
                    catalog.converted.push(page.class_name);
                    manifest.record(UnitKind::Page, path, page.output_path, page.warnings);
                }
                Err(e) => {
                    error!("Failed converting page {}: {}", path.display(), e);
                    manifest.record_failure(UnitKind::Page, path, e.to_string());
                }
            }
        }

        for path in self.sources(UnitKind::Test, &mut manifest) {
            let converted = convert_test(&path, &test_out, &catalog, &self.config.script);
            match converted {
                Ok(Some(test)) => manifest.record(UnitKind::Test, path, test.output_path, test.warnings),
                Ok(None) => {
                    warn!("No @Test methods found in {}", path.display());
                    manifest.record_skipped(path);
                }
                Err(e) => {
                    error!("Failed converting test {}: {}", path.display(), e);
                    manifest.record_failure(UnitKind::Test, path, e.to_string());
                }
            }
        }

        if manifest.converted_count() == 0 {
            warn!("No matching Java page/test files found for conversion");
        } else {
            info!("Converted {} file(s)", manifest.converted_count());
        }
        manifest
    }

    fn sources(&self, kind: UnitKind, manifest: &mut ConversionManifest) -> Vec<PathBuf> {
        let (root, filter) = match kind {
            UnitKind::Page => (
                self.config.pages_input_dir(),
                self.config.paths.page_path_filter.as_deref(),
            ),
            UnitKind::Test => (
                self.config.tests_input_dir(),
                self.config.paths.test_path_filter.as_deref(),
            ),
        };
        if !root.is_dir() {
            info!("No {} sources at {}", kind, root.display());
            return Vec::new();
        }
        match collect_java_files(&root, filter) {
            Ok(files) => files,
            Err(e) => {
                error!("Failed walking {}: {}", root.display(), e);
                manifest.record_failure(kind, root, e.to_string());
                Vec::new()
            }
        }
    }
}

/// Every `.java` file under `root`, sorted by path. With `filter`, only
/// files that have that directory component below `root` are kept.
pub fn collect_java_files(root: &Path, filter: Option<&str>) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(MigrationError::DirectoryNotFound(root.to_path_buf()));
    }
    let mut files = Vec::new();
    walk(root, &mut files)?;
    files.retain(|path| {
        let is_java = path.extension().is_some_and(|ext| ext == "java");
        let matches_filter = filter.map_or(true, |component| {
            path.strip_prefix(root)
                .map(|relative| {
                    relative
                        .parent()
                        .is_some_and(|dir| dir.components().any(|c| c.as_os_str() == component))
                })
                .unwrap_or(false)
        });
        is_java && matches_filter
    });
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| MigrationError::read(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| MigrationError::read(dir, e))?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn config_for(root: &Path) -> MigrationConfig {
        let mut config = MigrationConfig::default();
        config.paths.input_root = root.join("project");
        config.paths.output_root = root.join("converted");
        config
    }

    const HOME_PAGE: &str = r#"
package com.crm.qa.pages;
public class HomePage extends TestBase {
    @FindBy(xpath = "//a[contains(text(),'Contacts')]")
    WebElement contactsLink;

    public ContactsPage clickOnContactsLink() {
        contactsLink.click();
        return new ContactsPage();
    }
}
"#;

    const HOME_TEST: &str = r#"
package com.crm.qa.testcases;
import com.crm.qa.pages.HomePage;
public class HomePageTest extends TestBase {
    HomePage homePage;

    @Test
    public void verifyContactsLinkTest() {
        homePage.clickOnContactsLink();
        Assert.assertTrue(true);
    }
}
"#;

    #[test]
    fn test_collect_applies_extension_and_directory_filter() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "com/crm/qa/pages/B.java", "");
        write(root, "com/crm/qa/pages/A.java", "");
        write(root, "com/crm/qa/pages/notes.txt", "");
        write(root, "com/crm/qa/util/TestUtil.java", "");

        let files = collect_java_files(root, Some("pages")).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.java", "B.java"]);
        assert_eq!(collect_java_files(root, None).unwrap().len(), 3);
    }

    #[test]
    fn test_run_converts_pages_and_tests() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project");
        write(&project, "src/main/java/com/crm/qa/pages/HomePage.java", HOME_PAGE);
        write(&project, "src/main/java/com/crm/qa/util/TestUtil.java", "public class TestUtil {}");
        write(&project, "src/test/java/com/crm/qa/testcases/HomePageTest.java", HOME_TEST);

        let manifest = MigrationDriver::new(config_for(dir.path())).run();
        assert_eq!(manifest.converted_count(), 2);
        assert!(manifest.failures.is_empty());

        let page = fs::read_to_string(dir.path().join("converted/pages/HomePage.ts")).unwrap();
        assert!(page.contains(r"await this.page.click(`xpath=//a[contains(text(),\'Contacts\')]`);"));
        let test = fs::read_to_string(dir.path().join("converted/tests/HomePageTest.ts")).unwrap();
        assert!(test.contains("import { HomePage } from '../pages/HomePage';"));
        assert!(test.contains("await homePage.clickOnContactsLink();"));
        assert!(test.contains("await browser.close();"));

        assert!(manifest.entries[0].warnings[0].contains("page transitions are not modeled"));
        assert_eq!(
            manifest.entries[1].warnings,
            vec!["verification not ported: 1 assertion(s) dropped".to_string()]
        );
    }

    #[test]
    fn test_test_without_annotations_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project");
        write(&project, "src/test/java/com/crm/qa/testcases/Base.java", "public class Base { }");
        write(&project, "src/test/java/com/crm/qa/testcases/HomePageTest.java", HOME_TEST);

        let manifest = MigrationDriver::new(config_for(dir.path())).run();
        assert_eq!(manifest.skipped.len(), 1);
        assert!(manifest.skipped[0].ends_with("Base.java"));
        assert_eq!(manifest.converted_count(), 1);
    }

    #[test]
    fn test_wildcard_page_import_ignores_stale_modules() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project");
        write(&project, "src/main/java/com/crm/qa/pages/HomePage.java", HOME_PAGE);
        write(
            &project,
            "src/test/java/com/crm/qa/testcases/WildcardTest.java",
            r#"
import com.crm.qa.pages.*;
public class WildcardTest {
    HomePage homePage;
    DealsPage dealsPage;

    @Test
    public void open() {
        homePage.clickOnContactsLink();
    }
}
"#,
        );
        // module from an earlier run with no source any more
        write(dir.path(), "converted/pages/DealsPage.ts", "export class DealsPage {}");

        let manifest = MigrationDriver::new(config_for(dir.path())).run();
        assert!(manifest.failures.is_empty());
        let test = fs::read_to_string(dir.path().join("converted/tests/WildcardTest.ts")).unwrap();
        assert!(test.contains("import { HomePage } from '../pages/HomePage';"));
        assert!(!test.contains("DealsPage"));
    }

    #[test]
    fn test_unreadable_file_is_recorded_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project");
        write(&project, "src/main/java/pages/HomePage.java", HOME_PAGE);
        // invalid UTF-8 makes read_to_string fail
        let bad = project.join("src/main/java/pages/Broken.java");
        fs::write(&bad, [0xff, 0xfe, 0xfd]).unwrap();

        let manifest = MigrationDriver::new(config_for(dir.path())).run();
        assert_eq!(manifest.failures.len(), 1);
        assert_eq!(manifest.failures[0].input, bad);
        assert_eq!(manifest.converted_count(), 1);
    }

    #[test]
    fn test_empty_input_reports_zero_conversions() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = MigrationDriver::new(config_for(dir.path())).run();
        assert_eq!(manifest.converted_count(), 0);
        assert!(manifest.report().contains("No matching Java page/test files found"));
    }
}
