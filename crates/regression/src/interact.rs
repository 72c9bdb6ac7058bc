//! Interaction helpers shared by every scenario.
//!
//! - [`safe_click`]: scroll, settle, native click, scripted click only when
//!   the native one was intercepted
//! - [`find_save_control`]: ordered candidate lookup with a tagged result
//! - [`accept_confirmation`]: accept a dialog that may not appear
//! - form filling and product-list queries

use crate::driver::{Driver, ElementRef};
use crate::fixture::{ProductFixture, StockLevel};
use crate::locator::{form, list, stock_class, Locator, SAVE_CONTROL_CANDIDATES};
use crate::result::{RegressionError, RegressionResult};
use crate::session::Session;
use crate::wait::{poll_until, wait_until, WaitOptions};
use tracing::{debug, warn};

/// How a [`safe_click`] reached the element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMethod {
    /// Native pointer click
    Native,
    /// Scripted click after the native one was intercepted
    Script,
}

/// Save control currently rendered by the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveControl {
    /// The button
    pub element: ElementRef,
    /// Candidate that matched
    pub locator: Locator,
}

/// Element matching `locator`, waiting up to the implicit-wait ceiling
///
/// # Errors
///
/// Returns [`RegressionError::ElementNotFound`] when nothing matches in time.
pub async fn find<D: Driver>(
    session: &Session<D>,
    scope: Option<&ElementRef>,
    locator: &Locator,
) -> RegressionResult<ElementRef> {
    let driver = session.driver();
    poll_until(
        session.clock(),
        WaitOptions::implicit(session.timeouts()),
        locator.name,
        || async move { Ok(driver.find_all(scope, locator).await?.into_iter().next()) },
    )
    .await
    .map_err(|e| match e {
        RegressionError::Timeout { .. } => RegressionError::not_found(locator.to_string()),
        other => other,
    })
}

/// Element matching `locator` right now, if any
pub async fn find_optional<D: Driver>(
    session: &Session<D>,
    scope: Option<&ElementRef>,
    locator: &Locator,
) -> RegressionResult<Option<ElementRef>> {
    Ok(session.driver().find_all(scope, locator).await?.into_iter().next())
}

/// Click an element that may be covered by a transient overlay
///
/// Scrolls it to the viewport centre, pauses for the settle interval and
/// clicks natively. Only a [`RegressionError::ClickIntercepted`] triggers the
/// single scripted fallback; every other failure propagates.
pub async fn safe_click<D: Driver>(
    session: &Session<D>,
    element: &ElementRef,
) -> RegressionResult<ClickMethod> {
    let driver = session.driver();
    driver.scroll_into_view_center(element).await?;
    session.clock().sleep(session.timeouts().settle()).await;

    match driver.native_click(element).await {
        Ok(()) => Ok(ClickMethod::Native),
        Err(RegressionError::ClickIntercepted { message, .. }) => {
            warn!(element = %element, %message, "native click intercepted, clicking from script");
            driver.script_click(element).await?;
            Ok(ClickMethod::Script)
        }
        Err(e) => Err(e),
    }
}

/// First of `candidates` currently rendered, in order
pub async fn first_present<D: Driver + ?Sized>(
    driver: &D,
    candidates: &[Locator],
) -> RegressionResult<Option<SaveControl>> {
    for locator in candidates {
        if let Some(element) = driver.find_all(None, locator).await?.into_iter().next() {
            return Ok(Some(SaveControl {
                element,
                locator: *locator,
            }));
        }
    }
    Ok(None)
}

/// Resolve the form's save control in either mode
///
/// Tries the update button, then the save button, then the shared save class,
/// re-probing the whole list until the element wait elapses.
///
/// # Errors
///
/// Returns [`RegressionError::SaveControlNotFound`] when no candidate renders.
pub async fn find_save_control<D: Driver>(session: &Session<D>) -> RegressionResult<SaveControl> {
    let driver = session.driver();
    let control = poll_until(
        session.clock(),
        WaitOptions::element(session.timeouts()),
        "save control",
        || first_present(driver, &SAVE_CONTROL_CANDIDATES),
    )
    .await
    .map_err(|e| match e {
        RegressionError::Timeout { .. } => RegressionError::SaveControlNotFound {
            tried: SAVE_CONTROL_CANDIDATES
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        },
        other => other,
    })?;
    debug!(locator = control.locator.name, "save control resolved");
    Ok(control)
}

/// Accept a confirmation dialog if one opens within the short wait
///
/// Returns whether a dialog was accepted. A missing dialog is not an error.
pub async fn accept_confirmation<D: Driver>(session: &Session<D>) -> RegressionResult<bool> {
    let driver = session.driver();
    let options = WaitOptions::new(session.timeouts().short_wait(), session.timeouts().poll_interval());
    let accepted = poll_until(session.clock(), options, "confirmation dialog", || async move {
        match driver.accept_dialog().await {
            Ok(()) => Ok(Some(())),
            Err(RegressionError::DialogAbsent) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await;

    match accepted {
        Ok(()) => Ok(true),
        Err(RegressionError::Timeout { .. }) => {
            debug!("no confirmation dialog appeared");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Replace an input's value
pub async fn type_into<D: Driver>(
    session: &Session<D>,
    locator: &Locator,
    text: &str,
) -> RegressionResult<()> {
    let input = find(session, None, locator).await?;
    session.driver().clear(&input).await?;
    session.driver().send_keys(&input, text).await
}

/// Fill the product form from a fixture
///
/// The description is typed only when the form renders that field.
pub async fn fill_product_form<D: Driver>(
    session: &Session<D>,
    fixture: &ProductFixture,
) -> RegressionResult<()> {
    type_into(session, &form::NAME_INPUT, fixture.name).await?;
    if !fixture.description.is_empty() {
        if let Some(input) = find_optional(session, None, &form::DESCRIPTION_INPUT).await? {
            session.driver().clear(&input).await?;
            session.driver().send_keys(&input, fixture.description).await?;
        }
    }
    type_into(session, &form::PRICE_INPUT, fixture.price).await?;
    type_into(session, &form::STOCK_INPUT, fixture.stock).await?;
    type_into(session, &form::STOCK_MINIMO_INPUT, fixture.stock_minimo).await
}

/// Submit the form through whichever save control is rendered
pub async fn submit_form<D: Driver>(session: &Session<D>) -> RegressionResult<SaveControl> {
    let control = find_save_control(session).await?;
    let _ = safe_click(session, &control.element).await?;
    Ok(control)
}

/// Create a product and wait until one more item carries its name
pub async fn create_product<D: Driver>(
    session: &Session<D>,
    fixture: &ProductFixture,
) -> RegressionResult<()> {
    let before = count_items_named(session, fixture.name).await?;
    fill_product_form(session, fixture).await?;
    let _ = submit_form(session).await?;
    wait_for_name_count(session, fixture.name, before + 1).await
}

/// Every rendered product item
pub async fn product_items<D: Driver>(session: &Session<D>) -> RegressionResult<Vec<ElementRef>> {
    session.driver().find_all(None, &list::ITEM).await
}

/// Heading text of a product item
pub async fn item_heading<D: Driver>(
    session: &Session<D>,
    item: &ElementRef,
) -> RegressionResult<String> {
    let heading = session.driver().find_first(Some(item), &list::ITEM_NAME).await?;
    session.driver().text(&heading).await
}

/// Headings of every rendered item, in order
pub async fn item_names<D: Driver>(session: &Session<D>) -> RegressionResult<Vec<String>> {
    let mut names = Vec::new();
    for item in product_items(session).await? {
        names.push(item_heading(session, &item).await?);
    }
    Ok(names)
}

/// Number of items whose heading contains `name`
pub async fn count_items_named<D: Driver>(session: &Session<D>, name: &str) -> RegressionResult<usize> {
    Ok(item_names(session)
        .await?
        .iter()
        .filter(|heading| heading.contains(name))
        .count())
}

/// Wait until exactly `expected` items have a heading containing `name`
///
/// # Errors
///
/// Returns [`RegressionError::AssertionFailed`] with the last observed count
/// when the element wait elapses.
pub async fn wait_for_name_count<D: Driver>(
    session: &Session<D>,
    name: &str,
    expected: usize,
) -> RegressionResult<()> {
    let result = wait_until(
        session.clock(),
        WaitOptions::element(session.timeouts()),
        name,
        || async move { Ok(count_items_named(session, name).await? == expected) },
    )
    .await;
    match result {
        Err(RegressionError::Timeout { ms, .. }) => {
            let seen = count_items_named(session, name).await?;
            Err(RegressionError::assertion(format!(
                "expected {expected} item(s) named {name:?} within {ms}ms, found {seen}"
            )))
        }
        other => other,
    }
}

/// First item whose heading is exactly `name`
pub async fn find_item_by_name<D: Driver>(
    session: &Session<D>,
    name: &str,
) -> RegressionResult<Option<ElementRef>> {
    for item in product_items(session).await? {
        if item_heading(session, &item).await?.trim() == name {
            return Ok(Some(item));
        }
    }
    Ok(None)
}

/// Like [`find_item_by_name`], waiting for the item to render
///
/// # Errors
///
/// Returns [`RegressionError::AssertionFailed`] when no such item appears.
pub async fn wait_for_item<D: Driver>(session: &Session<D>, name: &str) -> RegressionResult<ElementRef> {
    poll_until(
        session.clock(),
        WaitOptions::element(session.timeouts()),
        name,
        || find_item_by_name(session, name),
    )
    .await
    .map_err(|e| match e {
        RegressionError::Timeout { ms, .. } => {
            RegressionError::assertion(format!("no product item named {name:?} within {ms}ms"))
        }
        other => other,
    })
}

/// Stock level an item displays
///
/// A displayed badge wins; otherwise the item's state class decides.
/// `None` when the item signals nothing recognizable.
pub async fn stock_indicator<D: Driver>(
    session: &Session<D>,
    item: &ElementRef,
) -> RegressionResult<Option<StockLevel>> {
    let driver = session.driver();
    for (badge, level) in [
        (list::BADGE_CRITICAL, StockLevel::Out),
        (list::BADGE_WARNING, StockLevel::Low),
    ] {
        if let Some(element) = driver.find_all(Some(item), &badge).await?.into_iter().next() {
            if driver.is_displayed(&element).await? {
                return Ok(Some(level));
            }
        }
    }
    for (class, level) in [
        (stock_class::OUT, StockLevel::Out),
        (stock_class::LOW, StockLevel::Low),
        (stock_class::OK, StockLevel::Ok),
    ] {
        if driver.has_class(item, class).await? {
            return Ok(Some(level));
        }
    }
    Ok(None)
}

/// Open the edit form for `item`
pub async fn begin_edit<D: Driver>(session: &Session<D>, item: &ElementRef) -> RegressionResult<()> {
    let edit = find(session, Some(item), &list::EDIT_BUTTON).await?;
    let _ = safe_click(session, &edit).await?;
    // the form switches mode once the update control renders
    let driver = session.driver();
    wait_until(
        session.clock(),
        WaitOptions::element(session.timeouts()),
        "edit mode",
        || async move {
            Ok(!driver.find_all(None, &form::UPDATE_BUTTON).await?.is_empty()
                || !driver.find_all(None, &form::CANCEL_BUTTON).await?.is_empty())
        },
    )
    .await
}

/// Delete `item` and accept the confirmation if one appears
///
/// Returns whether a dialog was accepted.
pub async fn delete_item<D: Driver>(session: &Session<D>, item: &ElementRef) -> RegressionResult<bool> {
    let delete = find(session, Some(item), &list::DELETE_BUTTON).await?;
    let _ = safe_click(session, &delete).await?;
    accept_confirmation(session).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::config::SuiteConfig;
    use crate::fixture::{KEYBOARD, LAPTOP, MOUSE};
    use crate::screenshot::ScreenshotCapture;
    use crate::stub::{StockSignal, StubDriver};
    use std::sync::Arc;
    use std::time::Duration;

    async fn open(driver: StubDriver) -> (Session<StubDriver>, Arc<FakeClock>) {
        let clock = Arc::new(FakeClock::new());
        let session = Session::open(driver, SuiteConfig::default())
            .unwrap()
            .with_clock(clock.clone())
            .with_screenshots(ScreenshotCapture::disabled());
        let _ = session.open_app().await.unwrap();
        (session, clock)
    }

    async fn save_button(session: &Session<StubDriver>) -> ElementRef {
        session
            .driver()
            .find_first(None, &form::SAVE_CLASS)
            .await
            .unwrap()
    }

    async fn enter_edit_mode(session: &Session<StubDriver>) {
        let item = product_items(session).await.unwrap().remove(0);
        begin_edit(session, &item).await.unwrap();
    }

    // -------------------------------------------------------------------------
    // safe_click
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_safe_click_native_never_scripts() {
        let driver = StubDriver::new();
        let (session, clock) = open(driver.clone()).await;
        let button = save_button(&session).await;

        let method = safe_click(&session, &button).await.unwrap();

        assert_eq!(method, ClickMethod::Native);
        assert_eq!(driver.count_calls("native_click:"), 1);
        assert_eq!(driver.count_calls("script_click:"), 0);
        assert_eq!(driver.count_calls("scroll:"), 1);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn test_safe_click_intercepted_falls_back_once() {
        let driver = StubDriver::new().with_intercepted_clicks(1);
        let (session, _) = open(driver.clone()).await;
        let button = save_button(&session).await;

        let method = safe_click(&session, &button).await.unwrap();

        assert_eq!(method, ClickMethod::Script);
        assert_eq!(driver.count_calls("native_click:"), 1);
        assert_eq!(driver.count_calls("script_click:"), 1);
    }

    #[tokio::test]
    async fn test_safe_click_other_failure_propagates() {
        let driver = StubDriver::new().with_failing_clicks("element not interactable");
        let (session, _) = open(driver.clone()).await;
        let button = save_button(&session).await;

        let err = safe_click(&session, &button).await.unwrap_err();

        assert!(err.to_string().contains("element not interactable"));
        assert_eq!(driver.count_calls("script_click:"), 0);
    }

    #[tokio::test]
    async fn test_safe_click_order_is_scroll_then_click() {
        let driver = StubDriver::new();
        let (session, _) = open(driver.clone()).await;
        let button = save_button(&session).await;
        let _ = safe_click(&session, &button).await.unwrap();

        let history = driver.history();
        let scroll = history.iter().position(|c| c.starts_with("scroll:")).unwrap();
        let click = history.iter().position(|c| c.starts_with("native_click:")).unwrap();
        assert!(scroll < click);
    }

    // -------------------------------------------------------------------------
    // find_save_control
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_save_control_only_update_id() {
        let driver = StubDriver::new().with_product(&LAPTOP).without(form::SAVE_CLASS);
        let (session, _) = open(driver).await;
        enter_edit_mode(&session).await;

        let control = find_save_control(&session).await.unwrap();
        assert_eq!(control.locator, form::UPDATE_BUTTON);
    }

    #[tokio::test]
    async fn test_save_control_only_save_id() {
        let driver = StubDriver::new().without(form::SAVE_CLASS);
        let (session, _) = open(driver).await;
        let control = find_save_control(&session).await.unwrap();
        assert_eq!(control.locator, form::SAVE_BUTTON);
    }

    #[tokio::test]
    async fn test_save_control_only_class() {
        let driver = StubDriver::new().without(form::SAVE_BUTTON);
        let (session, _) = open(driver).await;
        let control = find_save_control(&session).await.unwrap();
        assert_eq!(control.locator, form::SAVE_CLASS);
    }

    #[tokio::test]
    async fn test_save_control_none_is_distinct_error() {
        let driver = StubDriver::new()
            .without(form::SAVE_BUTTON)
            .without(form::SAVE_CLASS);
        let (session, clock) = open(driver).await;

        let err = find_save_control(&session).await.unwrap_err();

        match err {
            RegressionError::SaveControlNotFound { tried } => {
                assert!(tried.starts_with("update_button"));
                assert!(tried.contains("save_class"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(clock.now_ms(), 10_000);
    }

    #[tokio::test]
    async fn test_save_control_update_beats_save() {
        let driver = StubDriver::new()
            .with_product(&LAPTOP)
            .with_save_button_in_edit_mode();
        let (session, _) = open(driver).await;
        enter_edit_mode(&session).await;

        assert_eq!(session.driver().find_all(None, &form::SAVE_BUTTON).await.unwrap().len(), 1);
        let control = find_save_control(&session).await.unwrap();
        assert_eq!(control.locator, form::UPDATE_BUTTON);
    }

    #[tokio::test]
    async fn test_save_control_save_beats_class() {
        let (session, _) = open(StubDriver::new()).await;
        assert_eq!(session.driver().find_all(None, &form::SAVE_CLASS).await.unwrap().len(), 1);
        let control = find_save_control(&session).await.unwrap();
        assert_eq!(control.locator, form::SAVE_BUTTON);
    }

    // -------------------------------------------------------------------------
    // accept_confirmation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_accept_confirmation_without_dialog_is_false() {
        let (session, clock) = open(StubDriver::new()).await;
        assert!(!accept_confirmation(&session).await.unwrap());
        assert_eq!(clock.now_ms(), 2_000);
    }

    #[tokio::test]
    async fn test_delete_accepts_dialog() {
        let driver = StubDriver::new().with_product(&MOUSE);
        let (session, _) = open(driver.clone()).await;
        let item = find_item_by_name(&session, MOUSE.name).await.unwrap().unwrap();

        assert!(delete_item(&session, &item).await.unwrap());
        assert!(driver.product_names().is_empty());
    }

    #[tokio::test]
    async fn test_delete_without_dialog_still_deletes() {
        let driver = StubDriver::new().with_product(&MOUSE).with_confirm_dialog(false);
        let (session, _) = open(driver.clone()).await;
        let item = find_item_by_name(&session, MOUSE.name).await.unwrap().unwrap();

        assert!(!delete_item(&session, &item).await.unwrap());
        assert!(driver.product_names().is_empty());
    }

    // -------------------------------------------------------------------------
    // form and list
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_product_adds_one_item() {
        let driver = StubDriver::new().with_product(&LAPTOP);
        let (session, _) = open(driver.clone()).await;

        create_product(&session, &LAPTOP).await.unwrap();

        assert_eq!(count_items_named(&session, LAPTOP.name).await.unwrap(), 2);
        assert_eq!(driver.product(LAPTOP.name), Some(("1500".to_string(), 50, 10)));
    }

    #[tokio::test]
    async fn test_create_product_blocked_reports_assertion() {
        let driver = StubDriver::new();
        let (session, _) = open(driver).await;
        let blank = ProductFixture {
            name: "Sin Precio",
            price: "",
            ..LAPTOP
        };

        let err = create_product(&session, &blank).await.unwrap_err();
        assert!(err.is_assertion());
    }

    #[tokio::test]
    async fn test_find_missing_element_times_out_as_not_found() {
        let (session, clock) = open(StubDriver::new()).await;
        let err = find(&session, None, &list::ITEM).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(clock.now_ms(), 10_000);
    }

    #[tokio::test]
    async fn test_stock_indicators() {
        let driver = StubDriver::new()
            .with_product(&LAPTOP)
            .with_product(&MOUSE)
            .with_product(&KEYBOARD);
        let (session, _) = open(driver).await;

        for fixture in [LAPTOP, MOUSE, KEYBOARD] {
            let item = find_item_by_name(&session, fixture.name).await.unwrap().unwrap();
            assert_eq!(
                stock_indicator(&session, &item).await.unwrap(),
                Some(fixture.expected_level())
            );
        }
    }

    #[tokio::test]
    async fn test_stock_indicator_from_classes_only() {
        let driver = StubDriver::new()
            .with_product(&KEYBOARD)
            .with_stock_signal(StockSignal::Classes);
        let (session, _) = open(driver).await;
        let item = find_item_by_name(&session, KEYBOARD.name).await.unwrap().unwrap();
        assert_eq!(
            stock_indicator(&session, &item).await.unwrap(),
            Some(StockLevel::Out)
        );
    }

    #[tokio::test]
    async fn test_wait_for_item_missing_is_assertion() {
        let (session, _) = open(StubDriver::new()).await;
        let err = wait_for_item(&session, "Fantasma").await.unwrap_err();
        assert!(err.is_assertion());
    }
}
