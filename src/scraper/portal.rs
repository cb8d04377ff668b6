use super::{BrowserLauncher, PortalPage, RecordScraper};
use crate::models::StudentRecord;
use crate::utils::AppError;
use async_trait::async_trait;
use std::sync::Arc;

/// CSS selectors of the portal pages walked by the login flow.
#[derive(Debug, Clone)]
pub struct PortalSelectors {
    pub username_input: String,
    pub next_button: String,
    pub password_input: String,
    pub submit_button: String,
    pub student_main_link: String,
    pub student_name: String,
    pub total_percentage: String,
    pub subject_table: String,
    pub subject_rows: String,
    pub subject_cells: String,
    pub daywise_rows: String,
    pub daywise_cells: String,
    pub student_status: String,
    pub current_date: String,
    pub last_login: String,
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            username_input: "#txtUserName".to_string(),
            next_button: "#btnNext".to_string(),
            password_input: "#txtPassword".to_string(),
            submit_button: "#btnSubmit".to_string(),
            student_main_link: "#ctl00_cpStud_lnkStudentMain".to_string(),
            student_name: "#ctl00_cpHeader_ucStud_lblStudentName".to_string(),
            total_percentage: "#ctl00_cpStud_lblTotalPercentage".to_string(),
            subject_table: "#ctl00_cpStud_grdSubject".to_string(),
            subject_rows: "#ctl00_cpStud_grdSubject tr".to_string(),
            subject_cells: "td".to_string(),
            daywise_rows: "#ctl00_cpStud_grdDaywise tr".to_string(),
            daywise_cells: "th, td".to_string(),
            student_status: "#ctl00_cpHeader_ucStud_lblStudentStatus".to_string(),
            current_date: "#ctl00_cpHeader_ucStud_lblNowDate".to_string(),
            last_login: "#ctl00_cpHeader_ucStud_lbllogin".to_string(),
        }
    }
}

/// Logs into the portal as a student and reads the dashboard.
///
/// Every call launches its own browser and closes it before returning,
/// whether the flow succeeded or not.
pub struct PortalScraper {
    launcher: Arc<dyn BrowserLauncher>,
    login_url: String,
    selectors: PortalSelectors,
}

impl PortalScraper {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, login_url: impl Into<String>) -> Self {
        Self {
            launcher,
            login_url: login_url.into(),
            selectors: PortalSelectors::default(),
        }
    }

    #[cfg(test)]
    pub fn with_selectors(mut self, selectors: PortalSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    async fn run_flow(
        &self,
        page: &dyn PortalPage,
        username: &str,
    ) -> Result<StudentRecord, AppError> {
        let s = &self.selectors;

        log::info!("🌐 Navigating to login page...");
        page.goto(&self.login_url).await?;

        log::info!("⌨️  Filling in username...");
        page.wait_for(&s.username_input).await?;
        page.type_text(&s.username_input, username).await?;
        page.click(&s.next_button).await?;

        // The portal uses the roll number as the initial password
        log::info!("🔑 Filling in password...");
        page.wait_for(&s.password_input).await?;
        page.type_text(&s.password_input, username).await?;
        page.click(&s.submit_button).await?;

        log::info!("⏳ Waiting for main student page...");
        page.wait_for(&s.student_main_link).await?;
        page.click(&s.student_main_link).await?;

        page.wait_for(&s.student_name).await?;
        let name = page.text_content(&s.student_name).await?;

        page.wait_for(&s.total_percentage).await?;
        let total_percentage = page.text_content(&s.total_percentage).await?;

        log::info!("📊 Scraping table data...");
        page.wait_for(&s.subject_table).await?;
        let table_data = page.table_rows(&s.subject_rows, &s.subject_cells).await?;
        let tracking_table_data = page.table_rows(&s.daywise_rows, &s.daywise_cells).await?;

        let student_status = page.text_content(&s.student_status).await?;
        let current_date = page.text_content(&s.current_date).await?;
        let last_login = page.text_content(&s.last_login).await?;

        Ok(StudentRecord {
            name,
            total_percentage,
            table_data,
            tracking_table_data,
            student_status,
            current_date,
            last_login,
        })
    }
}

#[async_trait]
impl RecordScraper for PortalScraper {
    async fn scrape(&self, username: &str) -> Result<StudentRecord, AppError> {
        log::info!("🚀 Launching browser for {}...", username);
        let page = self
            .launcher
            .launch()
            .await
            .map_err(|e| AppError::scrape_failed(username, e))?;

        let outcome = self.run_flow(page.as_ref(), username).await;

        log::info!("🧹 Closing browser...");
        if let Err(e) = page.close().await {
            log::warn!("⚠️  Failed to close browser for {}: {}", username, e);
        }

        match outcome {
            Ok(record) => {
                log::info!("✅ Scraping completed successfully for {}", username);
                Ok(record)
            }
            Err(e) => {
                log::error!("❌ Scraping failed for {}: {}", username, e);
                Err(AppError::scrape_failed(username, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Page double that records every interaction and fails on one selector.
    struct ScriptedPage {
        log: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
        fail_on: Option<String>,
    }

    impl ScriptedPage {
        fn record(&self, entry: String, selector: &str) -> Result<(), AppError> {
            self.log.lock().unwrap().push(entry);
            if self.fail_on.as_deref() == Some(selector) {
                return Err(AppError::BrowserError(format!(
                    "Waiting for selector `{}` failed",
                    selector
                )));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PortalPage for ScriptedPage {
        async fn goto(&self, url: &str) -> Result<(), AppError> {
            self.record(format!("goto {}", url), url)
        }
        async fn wait_for(&self, selector: &str) -> Result<(), AppError> {
            self.record(format!("wait {}", selector), selector)
        }
        async fn type_text(&self, selector: &str, text: &str) -> Result<(), AppError> {
            self.record(format!("type {} {}", selector, text), selector)
        }
        async fn click(&self, selector: &str) -> Result<(), AppError> {
            self.record(format!("click {}", selector), selector)
        }
        async fn text_content(&self, selector: &str) -> Result<String, AppError> {
            self.record(format!("text {}", selector), selector)?;
            Ok(format!("text of {}", selector))
        }
        async fn table_rows(
            &self,
            row_selector: &str,
            cell_selector: &str,
        ) -> Result<Vec<Vec<String>>, AppError> {
            self.record(format!("rows {} {}", row_selector, cell_selector), row_selector)?;
            Ok(vec![vec![], vec![row_selector.to_string(), cell_selector.to_string()]])
        }
        async fn close(self: Box<Self>) -> Result<(), AppError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ScriptedLauncher {
        log: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
        fail_on: Option<String>,
        launch_fails: bool,
    }

    impl ScriptedLauncher {
        fn new(fail_on: Option<&str>) -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(AtomicBool::new(false)),
                fail_on: fail_on.map(str::to_string),
                launch_fails: false,
            }
        }
    }

    #[async_trait]
    impl BrowserLauncher for ScriptedLauncher {
        async fn launch(&self) -> Result<Box<dyn PortalPage>, AppError> {
            if self.launch_fails {
                return Err(AppError::BrowserError("failed to launch Chromium".to_string()));
            }
            Ok(Box::new(ScriptedPage {
                log: Arc::clone(&self.log),
                closed: Arc::clone(&self.closed),
                fail_on: self.fail_on.clone(),
            }))
        }
    }

    fn scraper_with(launcher: &Arc<ScriptedLauncher>) -> PortalScraper {
        PortalScraper::new(
            Arc::clone(launcher) as Arc<dyn BrowserLauncher>,
            "http://portal.test/Login.aspx",
        )
    }

    #[tokio::test]
    async fn test_flow_extracts_every_field_and_closes_browser() {
        let launcher = Arc::new(ScriptedLauncher::new(None));
        let record = scraper_with(&launcher).scrape("21B91A05U4").await.unwrap();

        assert_eq!(record.name, "text of #ctl00_cpHeader_ucStud_lblStudentName");
        assert_eq!(record.total_percentage, "text of #ctl00_cpStud_lblTotalPercentage");
        assert_eq!(record.table_data[1], vec!["#ctl00_cpStud_grdSubject tr", "td"]);
        assert_eq!(record.tracking_table_data[1], vec!["#ctl00_cpStud_grdDaywise tr", "th, td"]);
        assert_eq!(record.student_status, "text of #ctl00_cpHeader_ucStud_lblStudentStatus");
        assert_eq!(record.current_date, "text of #ctl00_cpHeader_ucStud_lblNowDate");
        assert_eq!(record.last_login, "text of #ctl00_cpHeader_ucStud_lbllogin");
        assert!(launcher.closed.load(Ordering::SeqCst));

        let log = launcher.log.lock().unwrap();
        assert_eq!(log[0], "goto http://portal.test/Login.aspx");
    }

    #[tokio::test]
    async fn test_username_is_typed_into_both_login_fields() {
        let launcher = Arc::new(ScriptedLauncher::new(None));
        scraper_with(&launcher).scrape("21B91A05U4").await.unwrap();

        let log = launcher.log.lock().unwrap();
        let user_pos = log.iter().position(|e| e == "type #txtUserName 21B91A05U4").unwrap();
        let next_pos = log.iter().position(|e| e == "click #btnNext").unwrap();
        let pass_pos = log.iter().position(|e| e == "type #txtPassword 21B91A05U4").unwrap();
        let submit_pos = log.iter().position(|e| e == "click #btnSubmit").unwrap();
        assert!(user_pos < next_pos && next_pos < pass_pos && pass_pos < submit_pos);
    }

    #[tokio::test]
    async fn test_failure_mid_flow_closes_browser_and_names_username() {
        let launcher = Arc::new(ScriptedLauncher::new(Some("#ctl00_cpStud_lnkStudentMain")));
        let err = scraper_with(&launcher).scrape("21B91A05U4").await.unwrap_err();

        match &err {
            AppError::ScrapeFailed { username, message } => {
                assert_eq!(username, "21B91A05U4");
                assert!(message.contains("#ctl00_cpStud_lnkStudentMain"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("username 21B91A05U4"));
        assert!(launcher.closed.load(Ordering::SeqCst));

        // Nothing after the failing step ran
        let log = launcher.log.lock().unwrap();
        assert!(!log.iter().any(|e| e.starts_with("text ")));
    }

    #[tokio::test]
    async fn test_launch_failure_is_wrapped() {
        let mut launcher = ScriptedLauncher::new(None);
        launcher.launch_fails = true;
        let launcher = Arc::new(launcher);

        let err = scraper_with(&launcher).scrape("21B91A05U4").await.unwrap_err();

        assert!(matches!(err, AppError::ScrapeFailed { ref username, .. } if username == "21B91A05U4"));
        assert!(!launcher.closed.load(Ordering::SeqCst));
        assert!(launcher.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_selectors_drive_the_flow() {
        let launcher = Arc::new(ScriptedLauncher::new(None));
        let selectors = PortalSelectors {
            username_input: "#login".to_string(),
            ..PortalSelectors::default()
        };
        scraper_with(&launcher)
            .with_selectors(selectors)
            .scrape("abc")
            .await
            .unwrap();

        let log = launcher.log.lock().unwrap();
        assert!(log.contains(&"type #login abc".to_string()));
        assert!(!log.iter().any(|e| e.contains("#txtUserName")));
    }
}
