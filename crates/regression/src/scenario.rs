//! The ten regression scenarios.
//!
//! Each scenario starts on a freshly loaded page (the runner navigates and
//! waits for the form) and returns a short pass detail, or an error. Failed
//! checks are [`RegressionError::AssertionFailed`]; anything else means the
//! scenario could not be carried out.

use crate::driver::{Driver, ElementRef};
use crate::fixture::{
    ProductFixture, StockLevel, EDITED_PRICE, EDIT_SUFFIX, KEYBOARD, LAPTOP, LIFECYCLE_STOCK, MOUSE,
};
use crate::interact::{
    begin_edit, count_items_named, create_product, delete_item, fill_product_form, find,
    find_item_by_name, find_optional, find_save_control, product_items, safe_click,
    stock_indicator, submit_form, type_into, wait_for_item, wait_for_name_count,
};
use crate::locator::{dashboard, filters, form, list, stock_class, Locator};
use crate::result::{ensure, RegressionError, RegressionResult};
use crate::session::Session;
use crate::wait::{poll_until, wait_until, WaitOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Scenario identity, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioId {
    /// TC-REG-001
    CreateBasicProduct,
    /// TC-REG-002
    ListProducts,
    /// TC-REG-003
    EditProduct,
    /// TC-REG-004
    DeleteProduct,
    /// TC-REG-005
    RequiredFieldValidation,
    /// TC-NEW-001
    CreateWithMinimumStock,
    /// TC-NEW-003
    LowStockAlert,
    /// TC-NEW-004
    ZeroStockAlert,
    /// TC-NEW-005
    DashboardMetrics,
    /// TC-INT-001
    FullLifecycle,
}

impl ScenarioId {
    /// Every scenario, in execution order
    pub const ALL: [Self; 10] = [
        Self::CreateBasicProduct,
        Self::ListProducts,
        Self::EditProduct,
        Self::DeleteProduct,
        Self::RequiredFieldValidation,
        Self::CreateWithMinimumStock,
        Self::LowStockAlert,
        Self::ZeroStockAlert,
        Self::DashboardMetrics,
        Self::FullLifecycle,
    ];

    /// Test-case code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CreateBasicProduct => "TC-REG-001",
            Self::ListProducts => "TC-REG-002",
            Self::EditProduct => "TC-REG-003",
            Self::DeleteProduct => "TC-REG-004",
            Self::RequiredFieldValidation => "TC-REG-005",
            Self::CreateWithMinimumStock => "TC-NEW-001",
            Self::LowStockAlert => "TC-NEW-003",
            Self::ZeroStockAlert => "TC-NEW-004",
            Self::DashboardMetrics => "TC-NEW-005",
            Self::FullLifecycle => "TC-INT-001",
        }
    }

    /// Kebab-case name
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::CreateBasicProduct => "create-basic-product",
            Self::ListProducts => "list-products",
            Self::EditProduct => "edit-product",
            Self::DeleteProduct => "delete-product",
            Self::RequiredFieldValidation => "required-field-validation",
            Self::CreateWithMinimumStock => "create-with-minimum-stock",
            Self::LowStockAlert => "low-stock-alert",
            Self::ZeroStockAlert => "zero-stock-alert",
            Self::DashboardMetrics => "dashboard-metrics",
            Self::FullLifecycle => "full-lifecycle",
        }
    }

    /// One-line description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::CreateBasicProduct => "Create a product with the basic fields",
            Self::ListProducts => "List products with name, price and actions",
            Self::EditProduct => "Edit a product's name and price",
            Self::DeleteProduct => "Delete a product",
            Self::RequiredFieldValidation => "Name and price are required",
            Self::CreateWithMinimumStock => "Create a product with a minimum stock",
            Self::LowStockAlert => "Low stock is flagged",
            Self::ZeroStockAlert => "Zero stock is flagged",
            Self::DashboardMetrics => "Dashboard shows its metric cards",
            Self::FullLifecycle => "Create, edit and delete one product",
        }
    }

    /// 1-based position in the suite
    #[must_use]
    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|id| *id == self).map_or(0, |i| i + 1)
    }

    /// Screenshot name prefix, e.g. `test_003`
    #[must_use]
    pub fn screenshot_stem(self) -> String {
        format!("test_{:03}", self.ordinal())
    }

    /// Whether `filter` (case-insensitive) occurs in the code or slug
    #[must_use]
    pub fn matches(self, filter: &str) -> bool {
        let filter = filter.to_ascii_lowercase();
        self.code().to_ascii_lowercase().contains(&filter) || self.slug().contains(&filter)
    }

    /// Scenarios matching `filter`, in suite order; all when `None`
    #[must_use]
    pub fn select(filter: Option<&str>) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|id| filter.map_or(true, |f| id.matches(f)))
            .collect()
    }

    /// Run the scenario against a loaded page
    ///
    /// # Errors
    ///
    /// [`RegressionError::AssertionFailed`] when a check fails, any other
    /// variant when the scenario could not be carried out.
    pub async fn run<D: Driver>(self, session: &Session<D>) -> RegressionResult<String> {
        match self {
            Self::CreateBasicProduct => create_basic_product(session).await,
            Self::ListProducts => list_products(session).await,
            Self::EditProduct => edit_product(session).await,
            Self::DeleteProduct => delete_product(session).await,
            Self::RequiredFieldValidation => required_field_validation(session).await,
            Self::CreateWithMinimumStock => create_with_minimum_stock(session).await,
            Self::LowStockAlert => stock_alert(session, &MOUSE).await,
            Self::ZeroStockAlert => stock_alert(session, &KEYBOARD).await,
            Self::DashboardMetrics => dashboard_metrics(session).await,
            Self::FullLifecycle => full_lifecycle(session).await,
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// SHARED CHECKS
// =============================================================================

async fn wait_for_item_count<D: Driver>(session: &Session<D>, expected: usize) -> RegressionResult<()> {
    let result = wait_until(
        session.clock(),
        WaitOptions::element(session.timeouts()),
        "product count",
        || async move { Ok(product_items(session).await?.len() == expected) },
    )
    .await;
    match result {
        Err(RegressionError::Timeout { ms, .. }) => {
            let seen = product_items(session).await?.len();
            Err(RegressionError::assertion(format!(
                "expected {expected} product item(s) within {ms}ms, found {seen}"
            )))
        }
        other => other,
    }
}

async fn text_of<D: Driver>(
    session: &Session<D>,
    scope: &ElementRef,
    locator: &Locator,
) -> RegressionResult<String> {
    let element = find(session, Some(scope), locator).await?;
    session.driver().text(&element).await
}

/// Whether `text` contains `number` as a whole run of digits
fn shows_number(text: &str, number: &str) -> bool {
    text.split(|c: char| !c.is_ascii_digit()).any(|run| run == number)
}

// =============================================================================
// SCENARIOS
// =============================================================================

async fn create_basic_product<D: Driver>(session: &Session<D>) -> RegressionResult<String> {
    let items_before = product_items(session).await?.len();
    let named_before = count_items_named(session, LAPTOP.name).await?;

    fill_product_form(session, &LAPTOP).await?;
    let save = find(session, None, &form::SAVE_BUTTON).await?;
    let _ = safe_click(session, &save).await?;

    wait_for_name_count(session, LAPTOP.name, named_before + 1).await?;
    let items_after = product_items(session).await?.len();
    ensure(items_after == items_before + 1, || {
        format!(
            "expected exactly one new item ({} -> {}), found {items_after}",
            items_before,
            items_before + 1
        )
    })?;
    Ok(format!("{} created", LAPTOP.name))
}

async fn list_products<D: Driver>(session: &Session<D>) -> RegressionResult<String> {
    create_product(session, &LAPTOP).await?;
    let _ = find(session, None, &list::CONTAINER).await?;

    let items = product_items(session).await?;
    let first = items
        .first()
        .ok_or_else(|| RegressionError::assertion("product list is empty"))?;

    let name = text_of(session, first, &list::ITEM_NAME).await?;
    ensure(!name.trim().is_empty(), || "first item has an empty name".to_string())?;
    let price = text_of(session, first, &list::ITEM_PRICE).await?;
    ensure(!price.trim().is_empty(), || format!("{name} has an empty price"))?;

    let driver = session.driver();
    for locator in [list::EDIT_BUTTON, list::DELETE_BUTTON] {
        let button = find(session, Some(first), &locator).await?;
        ensure(driver.is_displayed(&button).await?, || {
            format!("{} of {name} is not displayed", locator.name)
        })?;
    }
    Ok(format!("{} product(s) listed", items.len()))
}

async fn edit_product<D: Driver>(session: &Session<D>) -> RegressionResult<String> {
    create_product(session, &LAPTOP).await?;
    let item = wait_for_item(session, LAPTOP.name).await?;

    let new_name = format!("{}{EDIT_SUFFIX}", LAPTOP.name);
    let edited_before = count_items_named(session, &new_name).await?;

    begin_edit(session, &item).await?;
    type_into(session, &form::NAME_INPUT, &new_name).await?;
    type_into(session, &form::PRICE_INPUT, EDITED_PRICE).await?;
    let control = submit_form(session).await?;
    debug!(locator = control.locator.name, "edit submitted");

    wait_for_name_count(session, &new_name, edited_before + 1).await?;
    Ok(format!("renamed to {new_name}"))
}

async fn delete_product<D: Driver>(session: &Session<D>) -> RegressionResult<String> {
    create_product(session, &MOUSE).await?;
    let items_before = product_items(session).await?.len();
    let named_before = count_items_named(session, MOUSE.name).await?;
    let item = wait_for_item(session, MOUSE.name).await?;

    let confirmed = delete_item(session, &item).await?;
    wait_for_item_count(session, items_before - 1).await?;

    let named_after = count_items_named(session, MOUSE.name).await?;
    ensure(named_after + 1 == named_before, || {
        format!("{} still listed {named_after} time(s), expected {}", MOUSE.name, named_before - 1)
    })?;
    Ok(if confirmed {
        "deleted after confirmation".to_string()
    } else {
        "deleted without confirmation dialog".to_string()
    })
}

async fn required_field_validation<D: Driver>(session: &Session<D>) -> RegressionResult<String> {
    let items_before = product_items(session).await?.len();
    let control = find_save_control(session).await?;
    let _ = safe_click(session, &control.element).await?;

    let driver = session.driver();
    for locator in [form::NAME_INPUT, form::PRICE_INPUT] {
        let input = find(session, None, &locator).await?;
        ensure(driver.attribute(&input, "required").await?.is_some(), || {
            format!("{} is not marked required", locator.name)
        })?;
    }

    let items_after = product_items(session).await?.len();
    ensure(items_after == items_before, || {
        format!("empty form was submitted: {items_before} -> {items_after} items")
    })?;
    Ok("name and price required".to_string())
}

async fn create_with_minimum_stock<D: Driver>(session: &Session<D>) -> RegressionResult<String> {
    let input = find(session, None, &form::STOCK_MINIMO_INPUT).await?;
    ensure(session.driver().is_displayed(&input).await?, || {
        "minimum stock input is not displayed".to_string()
    })?;

    create_product(session, &LAPTOP).await?;
    let count = product_items(session).await?.len();
    ensure(count > 0, || "product list is empty".to_string())?;
    Ok(format!("created with minimum stock {}", LAPTOP.stock_minimo))
}

/// Create `fixture` and check its item shows its stock level and no other
async fn stock_alert<D: Driver>(session: &Session<D>, fixture: &ProductFixture) -> RegressionResult<String> {
    create_product(session, fixture).await?;
    let item = wait_for_item(session, fixture.name).await?;

    let expected = fixture.expected_level();
    let shown = stock_indicator(session, &item).await?;
    ensure(shown == Some(expected), || {
        format!("{} should show {expected} stock, shows {shown:?}", fixture.name)
    })?;

    let driver = session.driver();
    let (other_badge, other_class) = match expected {
        StockLevel::Out => (list::BADGE_WARNING, stock_class::LOW),
        StockLevel::Low | StockLevel::Ok => (list::BADGE_CRITICAL, stock_class::OUT),
    };
    let mut badge_shown = false;
    for badge in driver.find_all(Some(&item), &other_badge).await? {
        badge_shown |= driver.is_displayed(&badge).await?;
    }
    let class_shown = driver.has_class(&item, other_class).await?;
    ensure(!badge_shown && !class_shown, || {
        format!("{} also shows the {} indicator", fixture.name, other_badge.name)
    })?;
    Ok(format!("{} shows {expected} stock", fixture.name))
}

async fn dashboard_metrics<D: Driver>(session: &Session<D>) -> RegressionResult<String> {
    let driver = session.driver();
    match find_optional(session, None, &filters::TOGGLE_DASHBOARD).await? {
        Some(toggle) => {
            if driver.text(&toggle).await?.contains(filters::TOGGLE_SHOW_TEXT) {
                info!(step = "toggle", "showing dashboard");
                let _ = safe_click(session, &toggle).await?;
            }
        }
        None => debug!("no dashboard toggle rendered"),
    }

    let shown = poll_until(
        session.clock(),
        WaitOptions::element(session.timeouts()),
        "dashboard",
        || async move {
            for element in driver.find_all(None, &dashboard::CONTAINER).await? {
                if driver.is_displayed(&element).await? {
                    return Ok(Some(element));
                }
            }
            Ok(None)
        },
    )
    .await;
    let container = match shown {
        Ok(container) => container,
        Err(RegressionError::Timeout { ms, .. }) => {
            return dashboard_unavailable(session, &format!("dashboard not displayed within {ms}ms"))
                .await;
        }
        Err(e) => return Err(e),
    };

    let cards = driver.find_all(Some(&container), &dashboard::METRIC_CARD).await?.len();
    if cards < dashboard::MIN_METRIC_CARDS {
        return dashboard_unavailable(
            session,
            &format!(
                "dashboard shows {cards} metric card(s), expected at least {}",
                dashboard::MIN_METRIC_CARDS
            ),
        )
        .await;
    }
    Ok(format!("dashboard shows {cards} metric cards"))
}

/// The dashboard is optional: record why it was not checked and pass
async fn dashboard_unavailable<D: Driver>(
    session: &Session<D>,
    reason: &str,
) -> RegressionResult<String> {
    let stem = ScenarioId::DashboardMetrics.screenshot_stem();
    let _ = session.screenshot(&format!("{stem}_error")).await;
    warn!(reason, "dashboard may be hidden initially");
    Ok(format!("{reason}; dashboard may be hidden initially"))
}

async fn full_lifecycle<D: Driver>(session: &Session<D>) -> RegressionResult<String> {
    let named_before = count_items_named(session, LAPTOP.name).await?;

    info!(step = "create", product = LAPTOP.name, "creating");
    create_product(session, &LAPTOP).await?;

    info!(step = "verify", "checking the list");
    let item = wait_for_item(session, LAPTOP.name).await?;

    info!(step = "edit", stock = LIFECYCLE_STOCK, "editing stock");
    begin_edit(session, &item).await?;
    type_into(session, &form::STOCK_INPUT, LIFECYCLE_STOCK).await?;
    let _ = submit_form(session).await?;

    let edited = poll_until(
        session.clock(),
        WaitOptions::element(session.timeouts()),
        "edited stock",
        || async move {
            let Some(item) = find_item_by_name(session, LAPTOP.name).await? else {
                return Ok(None);
            };
            let stocks = session.driver().find_all(Some(&item), &list::ITEM_STOCK).await?;
            let Some(stock) = stocks.first() else {
                return Ok(None);
            };
            let text = session.driver().text(stock).await?;
            Ok(shows_number(&text, LIFECYCLE_STOCK).then_some(item))
        },
    )
    .await
    .map_err(|e| match e {
        RegressionError::Timeout { ms, .. } => RegressionError::assertion(format!(
            "stock of {} did not change to {LIFECYCLE_STOCK} within {ms}ms",
            LAPTOP.name
        )),
        other => other,
    })?;

    let level = stock_indicator(session, &edited).await?;
    ensure(level == Some(StockLevel::Low), || {
        format!("edited product should show low stock, shows {level:?}")
    })?;

    info!(step = "delete", "deleting");
    let _ = delete_item(session, &edited).await?;
    wait_for_name_count(session, LAPTOP.name, named_before).await?;
    Ok("created, edited and deleted".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::config::SuiteConfig;
    use crate::screenshot::ScreenshotCapture;
    use crate::stub::{DashboardMode, StockSignal, StubDriver};
    use std::sync::Arc;

    async fn open(driver: StubDriver) -> Session<StubDriver> {
        let session = Session::open(driver, SuiteConfig::default())
            .unwrap()
            .with_clock(Arc::new(FakeClock::new()))
            .with_screenshots(ScreenshotCapture::disabled());
        let _ = session.open_app().await.unwrap();
        session
    }

    #[test]
    fn test_codes_and_slugs() {
        let codes: Vec<_> = ScenarioId::ALL.iter().map(|id| id.code()).collect();
        assert_eq!(
            codes,
            [
                "TC-REG-001", "TC-REG-002", "TC-REG-003", "TC-REG-004", "TC-REG-005",
                "TC-NEW-001", "TC-NEW-003", "TC-NEW-004", "TC-NEW-005", "TC-INT-001",
            ]
        );
        assert_eq!(ScenarioId::EditProduct.screenshot_stem(), "test_003");
        assert_eq!(ScenarioId::FullLifecycle.ordinal(), 10);
    }

    #[test]
    fn test_slug_matches_serde_name() {
        for id in ScenarioId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.slug()));
        }
    }

    #[test]
    fn test_select_by_filter() {
        assert_eq!(ScenarioId::select(None).len(), 10);
        assert_eq!(ScenarioId::select(Some("tc-new")).len(), 4);
        assert_eq!(
            ScenarioId::select(Some("stock-alert")),
            vec![ScenarioId::LowStockAlert, ScenarioId::ZeroStockAlert]
        );
        assert!(ScenarioId::select(Some("nothing")).is_empty());
    }

    #[test]
    fn test_shows_number() {
        assert!(shows_number("3", "3"));
        assert!(shows_number("Stock: 3", "3"));
        assert!(!shows_number("Stock: 13", "3"));
    }

    #[tokio::test]
    async fn test_create_basic_product() {
        let driver = StubDriver::new();
        let session = open(driver.clone()).await;
        let detail = ScenarioId::CreateBasicProduct.run(&session).await.unwrap();
        assert!(detail.contains(LAPTOP.name));
        assert_eq!(driver.product_names(), vec![LAPTOP.name.to_string()]);
    }

    #[tokio::test]
    async fn test_edit_product_renames() {
        let driver = StubDriver::new();
        let session = open(driver.clone()).await;
        let _ = ScenarioId::EditProduct.run(&session).await.unwrap();
        let edited = format!("{}{EDIT_SUFFIX}", LAPTOP.name);
        assert_eq!(driver.product(&edited), Some(("2000".to_string(), 50, 10)));
    }

    #[tokio::test]
    async fn test_delete_product_without_dialog() {
        let driver = StubDriver::new().with_confirm_dialog(false);
        let session = open(driver.clone()).await;
        let detail = ScenarioId::DeleteProduct.run(&session).await.unwrap();
        assert!(detail.contains("without"));
        assert!(driver.product_names().is_empty());
    }

    #[tokio::test]
    async fn test_validation_does_not_create() {
        let driver = StubDriver::new();
        let session = open(driver.clone()).await;
        let _ = ScenarioId::RequiredFieldValidation.run(&session).await.unwrap();
        assert!(driver.product_names().is_empty());
        assert!(driver.was_called("validation:blocked"));
    }

    #[tokio::test]
    async fn test_stock_alerts_with_badges_only() {
        let driver = StubDriver::new().with_stock_signal(StockSignal::Badges);
        let session = open(driver).await;
        let _ = ScenarioId::LowStockAlert.run(&session).await.unwrap();
        let _ = ScenarioId::ZeroStockAlert.run(&session).await.unwrap();
    }

    #[tokio::test]
    async fn test_dashboard_hidden_is_toggled_open() {
        let driver = StubDriver::new();
        let session = open(driver.clone()).await;
        let detail = ScenarioId::DashboardMetrics.run(&session).await.unwrap();
        assert!(detail.contains('4'));
        assert!(driver.was_called("native_click:toggle_dashboard"));
    }

    #[tokio::test]
    async fn test_dashboard_visible_is_left_alone() {
        let driver = StubDriver::new().with_dashboard(DashboardMode::Visible);
        let session = open(driver.clone()).await;
        let _ = ScenarioId::DashboardMetrics.run(&session).await.unwrap();
        assert!(!driver.was_called("native_click:toggle_dashboard"));
    }

    #[tokio::test]
    async fn test_dashboard_absent_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let driver = StubDriver::new().with_dashboard(DashboardMode::Absent);
        let session = open(driver)
            .await
            .with_screenshots(ScreenshotCapture::new(true, dir.path()));
        let detail = ScenarioId::DashboardMetrics.run(&session).await.unwrap();

        assert!(detail.contains("not displayed"), "{detail}");
        assert!(detail.contains("hidden initially"));
        let shots: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(shots.len(), 1);
        assert!(shots[0].starts_with("screenshot_test_009_error_"));
    }

    #[tokio::test]
    async fn test_dashboard_without_cards_is_tolerated() {
        let driver = StubDriver::new()
            .with_dashboard(DashboardMode::Visible)
            .without(dashboard::METRIC_CARD);
        let session = open(driver).await;
        let detail = ScenarioId::DashboardMetrics.run(&session).await.unwrap();
        assert!(detail.contains("0 metric card(s)"), "{detail}");
    }

    #[tokio::test]
    async fn test_full_lifecycle_leaves_no_product() {
        let driver = StubDriver::new();
        let session = open(driver.clone()).await;
        let _ = ScenarioId::FullLifecycle.run(&session).await.unwrap();
        assert!(driver.product_names().is_empty());
        assert_eq!(driver.count_calls("accept_dialog"), 1);
    }

    #[tokio::test]
    async fn test_missing_update_id_still_edits_via_class() {
        let driver = StubDriver::new().without(form::UPDATE_BUTTON);
        let session = open(driver.clone()).await;
        let result = ScenarioId::EditProduct.run(&session).await;
        // edit mode is detected through the cancel button
        assert!(result.is_ok(), "{result:?}");
    }
}
