//! Locator registry for the inventory application's rendered contract.
//!
//! Every semantic element the suite touches has exactly one [`Locator`],
//! defined here as `const` data. Scenarios never spell selectors inline.
//!
//! Locators are `(strategy, value)` pairs. They render to a CSS selector so a
//! single query path serves every strategy.

use serde::Serialize;
use std::fmt;

/// How a locator's value identifies elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Strategy {
    /// `id` attribute
    Id,
    /// Single class name
    Class,
    /// Arbitrary CSS selector
    Css,
    /// Tag name
    Tag,
    /// `placeholder` attribute
    Placeholder,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id => "id",
            Self::Class => "class",
            Self::Css => "css",
            Self::Tag => "tag",
            Self::Placeholder => "placeholder",
        };
        f.write_str(name)
    }
}

/// A named reference to one element or a collection of elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Locator {
    /// Semantic name (e.g. `name_input`)
    pub name: &'static str,
    /// Lookup strategy
    pub strategy: Strategy,
    /// Strategy-specific value
    pub value: &'static str,
}

impl Locator {
    /// Locate by `id`
    #[must_use]
    pub const fn id(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            strategy: Strategy::Id,
            value,
        }
    }

    /// Locate by a single class name
    #[must_use]
    pub const fn class(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            strategy: Strategy::Class,
            value,
        }
    }

    /// Locate by CSS selector
    #[must_use]
    pub const fn css(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            strategy: Strategy::Css,
            value,
        }
    }

    /// Locate by tag name
    #[must_use]
    pub const fn tag(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            strategy: Strategy::Tag,
            value,
        }
    }

    /// Locate by `placeholder` attribute
    #[must_use]
    pub const fn placeholder(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            strategy: Strategy::Placeholder,
            value,
        }
    }

    /// Render as a CSS selector
    #[must_use]
    pub fn to_css(&self) -> String {
        match self.strategy {
            Strategy::Id => format!("#{}", self.value),
            Strategy::Class => format!(".{}", self.value),
            Strategy::Css | Strategy::Tag => self.value.to_string(),
            Strategy::Placeholder => format!("[placeholder={:?}]", self.value),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}={})", self.name, self.strategy, self.value)
    }
}

// =============================================================================
// FORM
// =============================================================================

/// Product form fields and buttons
pub mod form {
    use super::Locator;

    /// Name input
    pub const NAME_INPUT: Locator = Locator::id("name_input", "nombre");
    /// Description input (not rendered by every build of the form)
    pub const DESCRIPTION_INPUT: Locator = Locator::id("description_input", "descripcion");
    /// Price input
    pub const PRICE_INPUT: Locator = Locator::id("price_input", "precio");
    /// Stock input
    pub const STOCK_INPUT: Locator = Locator::id("stock_input", "stock");
    /// Minimum stock input
    pub const STOCK_MINIMO_INPUT: Locator = Locator::id("stock_minimo_input", "stock_minimo");
    /// "New product" button
    pub const NEW_BUTTON: Locator = Locator::id("new_button", "btnNuevo");
    /// Save button (create mode)
    pub const SAVE_BUTTON: Locator = Locator::id("save_button", "btnGuardar");
    /// Update button (edit mode)
    pub const UPDATE_BUTTON: Locator = Locator::id("update_button", "btnActualizar");
    /// Save class shared by both modes
    pub const SAVE_CLASS: Locator = Locator::class("save_class", "btn-save");
    /// Cancel button (edit mode only)
    pub const CANCEL_BUTTON: Locator = Locator::class("cancel_button", "btn-cancel");
}

/// Save-control candidates in priority order: edit mode first, then create
/// mode, then the class both modes share.
pub const SAVE_CONTROL_CANDIDATES: [Locator; 3] =
    [form::UPDATE_BUTTON, form::SAVE_BUTTON, form::SAVE_CLASS];

// =============================================================================
// PRODUCT LIST
// =============================================================================

/// Product list and per-item controls
pub mod list {
    use super::Locator;

    /// List container
    pub const CONTAINER: Locator = Locator::class("products_container", "product-list");
    /// One product item
    pub const ITEM: Locator = Locator::class("product_item", "product-item");
    /// Item heading holding the product name
    pub const ITEM_NAME: Locator = Locator::tag("product_name", "h3");
    /// Item price
    pub const ITEM_PRICE: Locator = Locator::css("product_price", ".price");
    /// Item stock value
    pub const ITEM_STOCK: Locator = Locator::css("product_stock", ".stock-value");
    /// Item edit button
    pub const EDIT_BUTTON: Locator = Locator::class("edit_button", "btn-edit");
    /// Item delete button
    pub const DELETE_BUTTON: Locator = Locator::class("delete_button", "btn-delete");
    /// Item stock adjustment button
    pub const ADJUST_STOCK_BUTTON: Locator =
        Locator::class("adjust_stock_button", "btn-adjust-stock");
    /// Low-stock badge
    pub const BADGE_WARNING: Locator = Locator::css("stock_badge_warning", ".stock-badge.warning");
    /// Out-of-stock badge
    pub const BADGE_CRITICAL: Locator =
        Locator::css("stock_badge_critical", ".stock-badge.critical");
}

/// Stock-state classes carried by a product item
pub mod stock_class {
    /// Stock at or above the minimum
    pub const OK: &str = "ok-stock";
    /// Stock below the minimum
    pub const LOW: &str = "low-stock";
    /// No stock
    pub const OUT: &str = "out-of-stock";
}

// =============================================================================
// FILTERS, DASHBOARD, MESSAGES
// =============================================================================

/// Filter bar and search
pub mod filters {
    use super::Locator;

    /// Dashboard show/hide toggle
    pub const TOGGLE_DASHBOARD: Locator = Locator::class("toggle_dashboard", "btn-toggle-dashboard");
    /// Filter buttons
    pub const FILTER_BUTTON: Locator = Locator::class("filter_button", "filter-btn");
    /// Class marking the selected filter
    pub const ACTIVE_CLASS: &str = "active";
    /// Search box
    pub const SEARCH_INPUT: Locator = Locator::placeholder("search_input", "Buscar productos...");
    /// Search button
    pub const SEARCH_BUTTON: Locator = Locator::class("search_button", "btn-search");

    /// Toggle label when the dashboard is hidden
    pub const TOGGLE_SHOW_TEXT: &str = "Mostrar";
    /// Filter label: all products
    pub const TEXT_ALL: &str = "Todos";
    /// Filter label: low stock
    pub const TEXT_LOW_STOCK: &str = "Stock Bajo";
    /// Filter label: no stock
    pub const TEXT_NO_STOCK: &str = "Sin Stock";
    /// Filter label: critical
    pub const TEXT_CRITICAL: &str = "Críticos";
}

/// Inventory dashboard
pub mod dashboard {
    use super::Locator;

    /// Dashboard container
    pub const CONTAINER: Locator = Locator::class("dashboard_container", "inventory-dashboard");
    /// Metric card
    pub const METRIC_CARD: Locator = Locator::class("metric_card", "metric-card");
    /// Out-of-stock alert
    pub const ALERT_CRITICAL: Locator = Locator::class("alert_critical", "alert-critical");
    /// Low-stock alert
    pub const ALERT_WARNING: Locator = Locator::class("alert_warning", "alert-warning");

    /// Minimum number of metric cards the dashboard renders
    pub const MIN_METRIC_CARDS: usize = 4;
}

/// Status messages
pub mod messages {
    use super::Locator;

    /// Error banner
    pub const ERROR: Locator = Locator::css("error_message", ".error-message");
    /// Loading indicator
    pub const LOADING: Locator = Locator::css("loading", ".loading");
    /// Empty-list placeholder
    pub const EMPTY_STATE: Locator = Locator::css("empty_state", ".empty-state");
}
