//! StubDriver - in-memory model of the inventory application.
//!
//! Renders the same contract the real front end exposes (form, product list,
//! stock classes and badges, delete confirmation, dashboard behind a toggle)
//! from a small state machine, and answers [`Driver`] calls against it.
//!
//! The stub can be bent to reproduce the situations the helpers exist for:
//! intercepted clicks, missing save controls, no confirmation dialog.

use crate::driver::{Driver, ElementRef};
use crate::fixture::{ProductFixture, StockLevel};
use crate::locator::{dashboard, filters, form, list, messages, stock_class, Locator, Strategy};
use crate::result::{RegressionError, RegressionResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// PNG file signature returned by the stub screenshot
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Dashboard rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardMode {
    /// Neither dashboard nor toggle
    Absent,
    /// Toggle rendered, dashboard hidden after each page load
    #[default]
    Hidden,
    /// Toggle rendered, dashboard shown after each page load
    Visible,
}

/// How a product item signals its stock level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockSignal {
    /// State class on the item only
    Classes,
    /// Badge element only
    Badges,
    /// Both
    #[default]
    Both,
    /// Neither, as a build that dropped the stock alerts would render
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Name,
    Description,
    Price,
    Stock,
    Minimum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NodeKey {
    Input(Field),
    NewButton,
    SaveButton,
    UpdateButton,
    CancelButton,
    Toggle,
    Dashboard,
    MetricCard(usize),
    AlertCritical,
    AlertWarning,
    List,
    EmptyState,
    Item(u64),
    ItemName(u64),
    ItemPrice(u64),
    ItemStock(u64),
    ItemBadge(u64),
    ItemEdit(u64),
    ItemDelete(u64),
}

#[derive(Debug)]
struct Node {
    key: NodeKey,
    parent: Option<NodeKey>,
    tag: &'static str,
    id: Option<&'static str>,
    classes: Vec<&'static str>,
    placeholder: Option<&'static str>,
    text: String,
    required: bool,
    value: Option<String>,
}

impl Node {
    fn new(key: NodeKey, parent: Option<NodeKey>, tag: &'static str) -> Self {
        Self {
            key,
            parent,
            tag,
            id: None,
            classes: Vec::new(),
            placeholder: None,
            text: String::new(),
            required: false,
            value: None,
        }
    }

    fn with_id(mut self, id: Option<&'static str>) -> Self {
        self.id = id;
        self
    }

    fn with_class(mut self, class: Option<&'static str>) -> Self {
        self.classes.extend(class);
        self
    }

    fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| *c == class)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.map(str::to_string),
            "class" => (!self.classes.is_empty()).then(|| self.classes.join(" ")),
            "placeholder" => self.placeholder.map(str::to_string),
            "required" => self.required.then(|| "true".to_string()),
            "value" => self.value.clone(),
            _ => None,
        }
    }

    fn matches(&self, locator: &Locator) -> bool {
        match locator.strategy {
            Strategy::Id => self.id.is_some_and(|id| id == locator.value),
            Strategy::Class => self.has_class(locator.value),
            Strategy::Tag => self.tag.eq_ignore_ascii_case(locator.value),
            Strategy::Placeholder => self.placeholder.is_some_and(|p| p == locator.value),
            Strategy::Css => self.matches_compound(locator.value),
        }
    }

    /// `tag#id.class.class` selectors, no combinators
    fn matches_compound(&self, selector: &str) -> bool {
        let is_marker = |c: char| c == '.' || c == '#';
        let tag_end = selector.find(is_marker).unwrap_or(selector.len());
        let (tag, mut rest) = selector.split_at(tag_end);
        if !tag.is_empty() && !self.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(is_marker).unwrap_or(body.len());
            let name = &body[..end];
            let ok = if marker == '#' {
                self.id.is_some_and(|id| id == name)
            } else {
                self.has_class(name)
            };
            if !ok {
                return false;
            }
            rest = &body[end..];
        }
        true
    }
}

#[derive(Debug, Clone)]
struct Product {
    id: u64,
    name: String,
    description: String,
    price: String,
    stock: u32,
    minimum: u32,
}

impl Product {
    const fn level(&self) -> StockLevel {
        StockLevel::classify(self.stock, self.minimum)
    }
}

#[derive(Debug, Clone, Default)]
struct FormState {
    values: HashMap<Field, String>,
    editing: Option<u64>,
}

impl FormState {
    fn value(&self, field: Field) -> &str {
        self.values.get(&field).map_or("", String::as_str)
    }
}

#[derive(Debug)]
struct Options {
    intercepted_clicks: u32,
    click_failure: Option<String>,
    omitted: Vec<&'static str>,
    confirm_delete: bool,
    dashboard: DashboardMode,
    stock_signal: StockSignal,
    save_in_edit_mode: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            intercepted_clicks: 0,
            click_failure: None,
            omitted: Vec::new(),
            confirm_delete: true,
            dashboard: DashboardMode::default(),
            stock_signal: StockSignal::default(),
            save_in_edit_mode: false,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    options: Options,
    products: Vec<Product>,
    next_product: u64,
    form: FormState,
    dashboard_visible: bool,
    pending_delete: Option<u64>,
    loaded: bool,
    closed: bool,
    generation: u64,
    handles: HashMap<u64, (NodeKey, u64)>,
    next_handle: u64,
    history: Vec<String>,
}

impl State {
    /// Locator value unless the test omitted that locator
    fn keep(&self, locator: Locator) -> Option<&'static str> {
        (!self.options.omitted.contains(&locator.name)).then_some(locator.value)
    }

    fn render(&self) -> Vec<Node> {
        if !self.loaded {
            return Vec::new();
        }
        let mut nodes = Vec::new();
        self.render_form(&mut nodes);
        self.render_dashboard(&mut nodes);
        self.render_list(&mut nodes);
        nodes
    }

    fn render_form(&self, nodes: &mut Vec<Node>) {
        let inputs = [
            (Field::Name, form::NAME_INPUT, true),
            (Field::Description, form::DESCRIPTION_INPUT, false),
            (Field::Price, form::PRICE_INPUT, true),
            (Field::Stock, form::STOCK_INPUT, false),
            (Field::Minimum, form::STOCK_MINIMO_INPUT, false),
        ];
        for (field, locator, required) in inputs {
            let mut input = Node::new(NodeKey::Input(field), None, "input").with_id(self.keep(locator));
            input.required = required;
            input.value = Some(self.form.value(field).to_string());
            nodes.push(input);
        }

        nodes.push(
            Node::new(NodeKey::NewButton, None, "button")
                .with_id(self.keep(form::NEW_BUTTON))
                .with_text("Nuevo Producto"),
        );
        let editing = self.form.editing.is_some();
        if !editing || self.options.save_in_edit_mode {
            nodes.push(
                Node::new(NodeKey::SaveButton, None, "button")
                    .with_id(self.keep(form::SAVE_BUTTON))
                    .with_class(self.keep(form::SAVE_CLASS))
                    .with_text("Crear"),
            );
        }
        if editing {
            nodes.push(
                Node::new(NodeKey::UpdateButton, None, "button")
                    .with_id(self.keep(form::UPDATE_BUTTON))
                    .with_class(self.keep(form::SAVE_CLASS))
                    .with_text("Actualizar"),
            );
            nodes.push(
                Node::new(NodeKey::CancelButton, None, "button")
                    .with_class(self.keep(form::CANCEL_BUTTON))
                    .with_text("Cancelar"),
            );
        }
    }

    fn render_dashboard(&self, nodes: &mut Vec<Node>) {
        if self.options.dashboard == DashboardMode::Absent {
            return;
        }
        let label = if self.dashboard_visible {
            "Ocultar Dashboard"
        } else {
            "Mostrar Dashboard"
        };
        nodes.push(
            Node::new(NodeKey::Toggle, None, "button")
                .with_class(self.keep(filters::TOGGLE_DASHBOARD))
                .with_text(label),
        );
        if !self.dashboard_visible {
            return;
        }

        let parent = Some(NodeKey::Dashboard);
        nodes.push(
            Node::new(NodeKey::Dashboard, None, "div").with_class(self.keep(dashboard::CONTAINER)),
        );
        let low = self.count_level(StockLevel::Low);
        let out = self.count_level(StockLevel::Out);
        let total_units: u64 = self.products.iter().map(|p| u64::from(p.stock)).sum();
        let cards = [
            format!("Total Productos {}", self.products.len()),
            format!("Unidades {total_units}"),
            format!("Stock Bajo {low}"),
            format!("Sin Stock {out}"),
        ];
        for (i, text) in cards.into_iter().enumerate() {
            nodes.push(
                Node::new(NodeKey::MetricCard(i), parent, "div")
                    .with_class(self.keep(dashboard::METRIC_CARD))
                    .with_text(text),
            );
        }
        if out > 0 {
            nodes.push(
                Node::new(NodeKey::AlertCritical, parent, "div")
                    .with_class(self.keep(dashboard::ALERT_CRITICAL))
                    .with_text(format!("{out} productos sin stock")),
            );
        }
        if low > 0 {
            nodes.push(
                Node::new(NodeKey::AlertWarning, parent, "div")
                    .with_class(self.keep(dashboard::ALERT_WARNING))
                    .with_text(format!("{low} productos con stock bajo")),
            );
        }
    }

    fn render_list(&self, nodes: &mut Vec<Node>) {
        nodes.push(Node::new(NodeKey::List, None, "div").with_class(self.keep(list::CONTAINER)));
        if self.products.is_empty() {
            let mut empty = Node::new(NodeKey::EmptyState, Some(NodeKey::List), "p")
                .with_text("No hay productos registrados");
            empty.classes.push(messages::EMPTY_STATE.value.trim_start_matches('.'));
            nodes.push(empty);
            return;
        }

        let classes = matches!(self.options.stock_signal, StockSignal::Classes | StockSignal::Both);
        let badges = matches!(self.options.stock_signal, StockSignal::Badges | StockSignal::Both);
        for product in &self.products {
            let id = product.id;
            let item_key = NodeKey::Item(id);
            let parent = Some(item_key);
            let level = product.level();

            let mut item = Node::new(item_key, Some(NodeKey::List), "div").with_class(self.keep(list::ITEM));
            if classes {
                item.classes.push(match level {
                    StockLevel::Ok => stock_class::OK,
                    StockLevel::Low => stock_class::LOW,
                    StockLevel::Out => stock_class::OUT,
                });
            }
            item.text = format!("{} ${} Stock: {}", product.name, product.price, product.stock);
            nodes.push(item);

            nodes.push(Node::new(NodeKey::ItemName(id), parent, "h3").with_text(&product.name));
            let mut price = Node::new(NodeKey::ItemPrice(id), parent, "span")
                .with_text(format!("${}", product.price));
            price.classes.push("price");
            nodes.push(price);
            let mut stock = Node::new(NodeKey::ItemStock(id), parent, "span")
                .with_text(product.stock.to_string());
            stock.classes.push("stock-value");
            nodes.push(stock);

            if badges && level != StockLevel::Ok {
                let (severity, text) = if level == StockLevel::Out {
                    ("critical", "Sin stock")
                } else {
                    ("warning", "Stock bajo")
                };
                let mut badge = Node::new(NodeKey::ItemBadge(id), parent, "span").with_text(text);
                badge.classes.extend(["stock-badge", severity]);
                nodes.push(badge);
            }

            nodes.push(
                Node::new(NodeKey::ItemEdit(id), parent, "button")
                    .with_class(self.keep(list::EDIT_BUTTON))
                    .with_text("Editar"),
            );
            nodes.push(
                Node::new(NodeKey::ItemDelete(id), parent, "button")
                    .with_class(self.keep(list::DELETE_BUTTON))
                    .with_text("Eliminar"),
            );
        }
    }

    fn count_level(&self, level: StockLevel) -> usize {
        self.products.iter().filter(|p| p.level() == level).count()
    }

    fn ensure_usable(&self) -> RegressionResult<()> {
        if self.closed {
            return Err(RegressionError::script("browser session closed"));
        }
        if self.pending_delete.is_some() {
            return Err(RegressionError::script(
                "unexpected alert open: ¿Está seguro de eliminar este producto?",
            ));
        }
        Ok(())
    }

    /// Resolve a handle to the node it still points at
    fn resolve(&self, element: &ElementRef) -> RegressionResult<Node> {
        self.ensure_usable()?;
        let stale = || RegressionError::script(format!("stale element reference: {element}"));
        let (key, generation) = self.handles.get(&element.id()).copied().ok_or_else(stale)?;
        if generation != self.generation {
            return Err(stale());
        }
        self.render().into_iter().find(|n| n.key == key).ok_or_else(stale)
    }

    fn is_descendant(nodes: &[Node], key: NodeKey, ancestor: NodeKey) -> bool {
        let mut current = nodes.iter().find(|n| n.key == key).and_then(|n| n.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = nodes.iter().find(|n| n.key == parent).and_then(|n| n.parent);
        }
        false
    }

    fn reset_form(&mut self) {
        self.form = FormState::default();
    }

    fn activate(&mut self, key: NodeKey) {
        match key {
            NodeKey::NewButton | NodeKey::CancelButton => self.reset_form(),
            NodeKey::SaveButton | NodeKey::UpdateButton => self.submit(),
            NodeKey::Toggle => self.dashboard_visible = !self.dashboard_visible,
            NodeKey::ItemEdit(id) => self.begin_edit(id),
            NodeKey::ItemDelete(id) => {
                if self.options.confirm_delete {
                    self.pending_delete = Some(id);
                } else {
                    self.products.retain(|p| p.id != id);
                }
            }
            _ => {}
        }
    }

    fn begin_edit(&mut self, id: u64) {
        let Some(product) = self.products.iter().find(|p| p.id == id) else {
            return;
        };
        let values = HashMap::from([
            (Field::Name, product.name.clone()),
            (Field::Description, product.description.clone()),
            (Field::Price, product.price.clone()),
            (Field::Stock, product.stock.to_string()),
            (Field::Minimum, product.minimum.to_string()),
        ]);
        self.form = FormState {
            values,
            editing: Some(id),
        };
    }

    fn submit(&mut self) {
        let name = self.form.value(Field::Name).trim().to_string();
        let price = self.form.value(Field::Price).trim().to_string();
        if name.is_empty() || price.is_empty() {
            self.history.push("validation:blocked".to_string());
            return;
        }
        let stock = self.form.value(Field::Stock).trim().parse().unwrap_or(0);
        let minimum = self.form.value(Field::Minimum).trim().parse().unwrap_or(0);
        let description = self.form.value(Field::Description).to_string();

        match self.form.editing {
            Some(id) => {
                if let Some(product) = self.products.iter_mut().find(|p| p.id == id) {
                    product.name = name;
                    product.description = description;
                    product.price = price;
                    product.stock = stock;
                    product.minimum = minimum;
                }
            }
            None => {
                self.next_product += 1;
                self.products.push(Product {
                    id: self.next_product,
                    name,
                    description,
                    price,
                    stock,
                    minimum,
                });
            }
        }
        self.reset_form();
    }

    fn input_field(&self, element: &ElementRef) -> RegressionResult<Field> {
        match self.resolve(element)?.key {
            NodeKey::Input(field) => Ok(field),
            _ => Err(RegressionError::script(format!(
                "element not interactable: {element}"
            ))),
        }
    }
}

/// In-memory inventory application behind the [`Driver`] trait
///
/// Clones share the same application, so a test can keep a handle for
/// inspection while a session owns another.
#[derive(Debug, Clone, Default)]
pub struct StubDriver {
    state: Arc<Mutex<State>>,
}

impl StubDriver {
    /// Empty application with the default contract
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> RegressionResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| RegressionError::script("stub state poisoned"))
    }

    fn configure(self, apply: impl FnOnce(&mut State)) -> Self {
        if let Ok(mut state) = self.state.lock() {
            apply(&mut state);
        }
        self
    }

    /// Seed a product as if created earlier
    #[must_use]
    pub fn with_product(self, fixture: &ProductFixture) -> Self {
        let fixture = *fixture;
        self.configure(|state| {
            state.next_product += 1;
            state.products.push(Product {
                id: state.next_product,
                name: fixture.name.to_string(),
                description: fixture.description.to_string(),
                price: fixture.price.to_string(),
                stock: fixture.stock.parse().unwrap_or(0),
                minimum: fixture.stock_minimo.parse().unwrap_or(0),
            });
        })
    }

    /// The next `count` native clicks report interception
    #[must_use]
    pub fn with_intercepted_clicks(self, count: u32) -> Self {
        self.configure(|state| state.options.intercepted_clicks = count)
    }

    /// Every native click fails with a non-interception error
    #[must_use]
    pub fn with_failing_clicks(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.configure(|state| state.options.click_failure = Some(message))
    }

    /// Stop rendering the attribute `locator` matches on
    #[must_use]
    pub fn without(self, locator: Locator) -> Self {
        self.configure(|state| state.options.omitted.push(locator.name))
    }

    /// Enable or disable the delete confirmation dialog
    #[must_use]
    pub fn with_confirm_dialog(self, enabled: bool) -> Self {
        self.configure(|state| state.options.confirm_delete = enabled)
    }

    /// Set the dashboard mode
    #[must_use]
    pub fn with_dashboard(self, mode: DashboardMode) -> Self {
        self.configure(|state| state.options.dashboard = mode)
    }

    /// Set how items signal stock level
    #[must_use]
    pub fn with_stock_signal(self, signal: StockSignal) -> Self {
        self.configure(|state| state.options.stock_signal = signal)
    }

    /// Keep rendering the create-mode save button while editing
    #[must_use]
    pub fn with_save_button_in_edit_mode(self) -> Self {
        self.configure(|state| state.options.save_in_edit_mode = true)
    }

    /// Drop every product, as a fresh backend would
    pub fn reset_data(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.products.clear();
            state.reset_form();
            state.pending_delete = None;
        }
    }

    /// Names of stored products, in creation order
    #[must_use]
    pub fn product_names(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.products.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Stored product with `name`, as `(price, stock, minimum)`
    #[must_use]
    pub fn product(&self, name: &str) -> Option<(String, u32, u32)> {
        let state = self.state.lock().ok()?;
        state
            .products
            .iter()
            .find(|p| p.name == name)
            .map(|p| (p.price.clone(), p.stock, p.minimum))
    }

    /// Whether a confirmation dialog is waiting
    #[must_use]
    pub fn is_dialog_open(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.pending_delete.is_some())
            .unwrap_or(false)
    }

    /// Recorded driver calls
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    /// Number of recorded calls starting with `prefix`
    #[must_use]
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.history().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Check if a call starting with `prefix` was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.count_calls(prefix) > 0
    }
}

#[async_trait]
impl Driver for StubDriver {
    async fn navigate(&self, url: &str) -> RegressionResult<()> {
        let mut state = self.state()?;
        if state.closed {
            return Err(RegressionError::Navigation {
                url: url.to_string(),
                message: "browser session closed".to_string(),
            });
        }
        state.history.push(format!("navigate:{url}"));
        state.loaded = true;
        state.generation += 1;
        state.handles.clear();
        state.pending_delete = None;
        state.reset_form();
        state.dashboard_visible = state.options.dashboard == DashboardMode::Visible;
        Ok(())
    }

    async fn find_all(
        &self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> RegressionResult<Vec<ElementRef>> {
        let mut state = self.state()?;
        let scope_key = match scope {
            Some(element) => Some(state.resolve(element)?.key),
            None => {
                state.ensure_usable()?;
                None
            }
        };
        let nodes = state.render();
        let keys: Vec<NodeKey> = nodes
            .iter()
            .filter(|n| n.matches(locator))
            .filter(|n| scope_key.map_or(true, |s| State::is_descendant(&nodes, n.key, s)))
            .map(|n| n.key)
            .collect();

        let generation = state.generation;
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            state.next_handle += 1;
            let id = state.next_handle;
            let _ = state.handles.insert(id, (key, generation));
            found.push(ElementRef::new(id, *locator));
        }
        Ok(found)
    }

    async fn text(&self, element: &ElementRef) -> RegressionResult<String> {
        Ok(self.state()?.resolve(element)?.text)
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> RegressionResult<Option<String>> {
        Ok(self.state()?.resolve(element)?.attribute(name))
    }

    async fn is_displayed(&self, element: &ElementRef) -> RegressionResult<bool> {
        self.state()?.resolve(element).map(|_| true)
    }

    async fn clear(&self, element: &ElementRef) -> RegressionResult<()> {
        let mut state = self.state()?;
        let field = state.input_field(element)?;
        let _ = state.form.values.remove(&field);
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> RegressionResult<()> {
        let mut state = self.state()?;
        let field = state.input_field(element)?;
        state.form.values.entry(field).or_default().push_str(text);
        Ok(())
    }

    async fn scroll_into_view_center(&self, element: &ElementRef) -> RegressionResult<()> {
        let mut state = self.state()?;
        let _ = state.resolve(element)?;
        state.history.push(format!("scroll:{}", element.locator().name));
        Ok(())
    }

    async fn native_click(&self, element: &ElementRef) -> RegressionResult<()> {
        let mut state = self.state()?;
        let node = state.resolve(element)?;
        state.history.push(format!("native_click:{}", element.locator().name));
        if let Some(message) = state.options.click_failure.clone() {
            return Err(RegressionError::script(message));
        }
        if state.options.intercepted_clicks > 0 {
            state.options.intercepted_clicks -= 1;
            return Err(RegressionError::ClickIntercepted {
                locator: element.locator().to_string(),
                message: "other element would receive the click: <div class=\"toast\">".to_string(),
            });
        }
        state.activate(node.key);
        Ok(())
    }

    async fn script_click(&self, element: &ElementRef) -> RegressionResult<()> {
        let mut state = self.state()?;
        let node = state.resolve(element)?;
        state.history.push(format!("script_click:{}", element.locator().name));
        state.activate(node.key);
        Ok(())
    }

    async fn accept_dialog(&self) -> RegressionResult<()> {
        let mut state = self.state()?;
        let id = state.pending_delete.take().ok_or(RegressionError::DialogAbsent)?;
        state.history.push("accept_dialog".to_string());
        state.products.retain(|p| p.id != id);
        Ok(())
    }

    async fn screenshot_png(&self) -> RegressionResult<Vec<u8>> {
        let mut state = self.state()?;
        if state.closed {
            return Err(RegressionError::Screenshot {
                message: "browser session closed".to_string(),
            });
        }
        state.history.push("screenshot".to_string());
        Ok(PNG_SIGNATURE.to_vec())
    }

    async fn close(&self) -> RegressionResult<()> {
        let mut state = self.state()?;
        state.history.push("close".to_string());
        state.closed = true;
        state.handles.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{KEYBOARD, LAPTOP, MOUSE};

    const URL: &str = "http://localhost:5173";

    async fn loaded(driver: StubDriver) -> StubDriver {
        driver.navigate(URL).await.unwrap();
        driver
    }

    async fn type_into(driver: &StubDriver, locator: Locator, text: &str) {
        let input = driver.find_first(None, &locator).await.unwrap();
        driver.clear(&input).await.unwrap();
        driver.send_keys(&input, text).await.unwrap();
    }

    #[tokio::test]
    async fn test_nothing_rendered_before_navigation() {
        let driver = StubDriver::new();
        assert!(driver.find_all(None, &form::NAME_INPUT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_through_form() {
        let driver = loaded(StubDriver::new()).await;
        type_into(&driver, form::NAME_INPUT, LAPTOP.name).await;
        type_into(&driver, form::PRICE_INPUT, LAPTOP.price).await;
        type_into(&driver, form::STOCK_INPUT, LAPTOP.stock).await;

        let save = driver.find_first(None, &form::SAVE_BUTTON).await.unwrap();
        driver.native_click(&save).await.unwrap();

        assert_eq!(driver.product_names(), vec![LAPTOP.name.to_string()]);
        let items = driver.find_all(None, &list::ITEM).await.unwrap();
        assert_eq!(items.len(), 1);
        let heading = driver.find_first(Some(&items[0]), &list::ITEM_NAME).await.unwrap();
        assert_eq!(driver.text(&heading).await.unwrap(), LAPTOP.name);
    }

    #[tokio::test]
    async fn test_empty_required_fields_block_submit() {
        let driver = loaded(StubDriver::new()).await;
        let save = driver.find_first(None, &form::SAVE_CLASS).await.unwrap();
        driver.native_click(&save).await.unwrap();

        assert!(driver.product_names().is_empty());
        assert!(driver.was_called("validation:blocked"));
        let name = driver.find_first(None, &form::NAME_INPUT).await.unwrap();
        assert_eq!(
            driver.attribute(&name, "required").await.unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_edit_mode_swaps_buttons() {
        let driver = loaded(StubDriver::new().with_product(&LAPTOP)).await;
        let edit = driver.find_first(None, &list::EDIT_BUTTON).await.unwrap();
        driver.native_click(&edit).await.unwrap();

        assert!(driver.find_all(None, &form::SAVE_BUTTON).await.unwrap().is_empty());
        assert_eq!(driver.find_all(None, &form::UPDATE_BUTTON).await.unwrap().len(), 1);
        assert_eq!(driver.find_all(None, &form::CANCEL_BUTTON).await.unwrap().len(), 1);
        let name = driver.find_first(None, &form::NAME_INPUT).await.unwrap();
        assert_eq!(
            driver.attribute(&name, "value").await.unwrap().as_deref(),
            Some(LAPTOP.name)
        );
    }

    #[tokio::test]
    async fn test_delete_waits_for_confirmation() {
        let driver = loaded(StubDriver::new().with_product(&MOUSE)).await;
        let delete = driver.find_first(None, &list::DELETE_BUTTON).await.unwrap();
        driver.native_click(&delete).await.unwrap();

        assert!(driver.is_dialog_open());
        assert!(driver.find_all(None, &list::ITEM).await.is_err());
        driver.accept_dialog().await.unwrap();
        assert!(driver.product_names().is_empty());
        assert!(matches!(
            driver.accept_dialog().await,
            Err(RegressionError::DialogAbsent)
        ));
    }

    #[tokio::test]
    async fn test_delete_without_dialog_is_immediate() {
        let driver = loaded(StubDriver::new().with_product(&MOUSE).with_confirm_dialog(false)).await;
        let delete = driver.find_first(None, &list::DELETE_BUTTON).await.unwrap();
        driver.native_click(&delete).await.unwrap();
        assert!(driver.product_names().is_empty());
        assert!(!driver.is_dialog_open());
    }

    #[tokio::test]
    async fn test_handles_go_stale_on_navigation() {
        let driver = loaded(StubDriver::new()).await;
        let name = driver.find_first(None, &form::NAME_INPUT).await.unwrap();
        driver.navigate(URL).await.unwrap();
        let err = driver.text(&name).await.unwrap_err();
        assert!(err.to_string().contains("stale"));
    }

    #[tokio::test]
    async fn test_stock_signals() {
        let driver = loaded(
            StubDriver::new()
                .with_product(&LAPTOP)
                .with_product(&MOUSE)
                .with_product(&KEYBOARD),
        )
        .await;
        let items = driver.find_all(None, &list::ITEM).await.unwrap();
        assert!(driver.has_class(&items[0], stock_class::OK).await.unwrap());
        assert!(driver.has_class(&items[1], stock_class::LOW).await.unwrap());
        assert!(driver.has_class(&items[2], stock_class::OUT).await.unwrap());

        let warning = driver.find_all(Some(&items[1]), &list::BADGE_WARNING).await.unwrap();
        let critical = driver.find_all(Some(&items[2]), &list::BADGE_CRITICAL).await.unwrap();
        assert_eq!(warning.len(), 1);
        assert_eq!(critical.len(), 1);
        assert!(driver.find_all(Some(&items[0]), &list::BADGE_WARNING).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_signal_renders_no_indicator() {
        let driver = loaded(
            StubDriver::new()
                .with_product(&KEYBOARD)
                .with_stock_signal(StockSignal::Missing),
        )
        .await;
        let item = driver.find_first(None, &list::ITEM).await.unwrap();
        assert!(!driver.has_class(&item, stock_class::OUT).await.unwrap());
        assert!(driver.find_all(Some(&item), &list::BADGE_CRITICAL).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_badges_only_signal() {
        let driver = loaded(
            StubDriver::new()
                .with_product(&MOUSE)
                .with_stock_signal(StockSignal::Badges),
        )
        .await;
        let item = driver.find_first(None, &list::ITEM).await.unwrap();
        assert!(!driver.has_class(&item, stock_class::LOW).await.unwrap());
        assert_eq!(driver.find_all(Some(&item), &list::BADGE_WARNING).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_toggle() {
        let driver = loaded(StubDriver::new()).await;
        assert!(driver.find_all(None, &dashboard::CONTAINER).await.unwrap().is_empty());

        let toggle = driver.find_first(None, &filters::TOGGLE_DASHBOARD).await.unwrap();
        assert!(driver.text(&toggle).await.unwrap().contains(filters::TOGGLE_SHOW_TEXT));
        driver.native_click(&toggle).await.unwrap();

        let container = driver.find_first(None, &dashboard::CONTAINER).await.unwrap();
        let cards = driver.find_all(Some(&container), &dashboard::METRIC_CARD).await.unwrap();
        assert_eq!(cards.len(), dashboard::MIN_METRIC_CARDS);
    }

    #[tokio::test]
    async fn test_interception_then_normal_clicks() {
        let driver = loaded(StubDriver::new().with_intercepted_clicks(1)).await;
        let toggle = driver.find_first(None, &filters::TOGGLE_DASHBOARD).await.unwrap();
        assert!(matches!(
            driver.native_click(&toggle).await,
            Err(RegressionError::ClickIntercepted { .. })
        ));
        driver.native_click(&toggle).await.unwrap();
        assert_eq!(driver.count_calls("native_click:"), 2);
    }

    #[tokio::test]
    async fn test_omitted_locator_is_not_found() {
        let driver = loaded(StubDriver::new().without(form::SAVE_BUTTON)).await;
        assert!(driver.find_all(None, &form::SAVE_BUTTON).await.unwrap().is_empty());
        assert_eq!(driver.find_all(None, &form::SAVE_CLASS).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_driver_rejects_calls() {
        let driver = loaded(StubDriver::new()).await;
        driver.close().await.unwrap();
        assert!(driver.navigate(URL).await.is_err());
        assert!(driver.screenshot_png().await.is_err());
    }

    #[test]
    fn test_compound_css_matching() {
        let mut node = Node::new(NodeKey::ItemBadge(1), None, "span");
        node.classes.extend(["stock-badge", "warning"]);
        assert!(node.matches_compound(".stock-badge.warning"));
        assert!(node.matches_compound("span.warning"));
        assert!(!node.matches_compound(".stock-badge.critical"));
        assert!(!node.matches_compound("div.warning"));
    }
}
