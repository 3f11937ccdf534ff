//! Price panel source port trait.

use crate::domain::error::TradeflowError;
use crate::domain::panel::PricePanel;

pub trait PanelPort {
    fn load_panel(&self) -> Result<PricePanel, TradeflowError>;
}
