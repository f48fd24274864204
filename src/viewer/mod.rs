mod colors;
mod inspect;
mod interaction;
mod scenario_view;
mod session;
mod symbols;

pub use colors::{ColorAssigner, DEFAULT_COLOR_KEY, FALLBACK_COLOR};
pub use inspect::{
    DetailEntry, EdgeDetails, Highlight, Legend, LegendColor, LegendSymbol, NodeDetails,
};
pub use interaction::InteractionOutcome;
pub use scenario_view::ScenarioView;
pub use session::{ActiveView, OverviewView, SessionContext, ViewerSession, OVERVIEW_CENTER_ID};
pub use symbols::SymbolCache;
