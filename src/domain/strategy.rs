//! Strategy contract.
//!
//! A strategy looks at a price panel and emits the trades it wants to make.
//! Any `Fn(&PricePanel) -> Vec<Trade>` closure is a strategy.

use crate::domain::panel::PricePanel;
use crate::domain::trade::Trade;

pub trait Strategy {
    /// Trades to make over `panel`. Trades need not be executed.
    fn logic(&self, panel: &PricePanel) -> Vec<Trade>;

    fn name(&self) -> String {
        short_type_name::<Self>().to_string()
    }

    fn description(&self) -> Option<String> {
        None
    }
}

impl<F> Strategy for F
where
    F: Fn(&PricePanel) -> Vec<Trade>,
{
    fn logic(&self, panel: &PricePanel) -> Vec<Trade> {
        self(panel)
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
