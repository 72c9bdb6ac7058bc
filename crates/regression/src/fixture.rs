//! Fixed product data driving the scenarios.
//!
//! Values are strings because they are typed into form fields verbatim.

use serde::Serialize;
use std::fmt;

/// Stock level a rendered product item should signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StockLevel {
    /// At or above the minimum
    Ok,
    /// Below the minimum but not zero
    Low,
    /// Zero
    Out,
}

impl StockLevel {
    /// Classify a stock count against its minimum
    #[must_use]
    pub const fn classify(stock: u32, minimum: u32) -> Self {
        if stock == 0 {
            Self::Out
        } else if stock < minimum {
            Self::Low
        } else {
            Self::Ok
        }
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::Low => "low",
            Self::Out => "out",
        })
    }
}

/// One product as typed into the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductFixture {
    /// Product name
    pub name: &'static str,
    /// Description (typed only when the form renders the field)
    pub description: &'static str,
    /// Price, decimal as string
    pub price: &'static str,
    /// Stock, integer as string
    pub stock: &'static str,
    /// Minimum stock, integer as string
    pub stock_minimo: &'static str,
}

impl ProductFixture {
    /// Level the application should render for this product
    ///
    /// Unparseable counts are treated as zero.
    #[must_use]
    pub fn expected_level(&self) -> StockLevel {
        let stock = self.stock.parse().unwrap_or(0);
        let minimum = self.stock_minimo.parse().unwrap_or(0);
        StockLevel::classify(stock, minimum)
    }
}

/// Normal stock
pub const LAPTOP: ProductFixture = ProductFixture {
    name: "Laptop HP Test",
    description: "Laptop para pruebas automatizadas",
    price: "1500",
    stock: "50",
    stock_minimo: "10",
};

/// Low stock (stock < stock_minimo)
pub const MOUSE: ProductFixture = ProductFixture {
    name: "Mouse Logitech",
    description: "Mouse inalámbrico",
    price: "250",
    stock: "3",
    stock_minimo: "10",
};

/// Zero stock
pub const KEYBOARD: ProductFixture = ProductFixture {
    name: "Teclado Mecánico",
    description: "Teclado RGB",
    price: "800",
    stock: "0",
    stock_minimo: "5",
};

/// Product created by the selector diagnostic
pub const DIAGNOSTIC: ProductFixture = ProductFixture {
    name: "Producto Diagnóstico",
    description: "",
    price: "100",
    stock: "50",
    stock_minimo: "10",
};

/// Suffix appended to a name by the edit scenario
pub const EDIT_SUFFIX: &str = " EDITADO";

/// Price typed by the edit scenario
pub const EDITED_PRICE: &str = "2000";

/// Stock typed by the lifecycle scenario's edit step
pub const LIFECYCLE_STOCK: &str = "3";
