//! Next-best-action ordering.
//!
//! Three views share one priority order (critical < high < medium < low):
//! the per-deal urgent subset, the portfolio "today" list, and the deal-room
//! list where completed items trail incomplete ones. All sorts are stable;
//! recommendation order within a tier is meaningful and must survive.

use crate::types::{Deal, NextBestAction, PortfolioAction};

/// The "urgent and actionable" subset of a deal's actions: incomplete and in
/// an urgent tier, ordered by priority.
pub fn urgent_actions(deal: &Deal) -> Vec<&NextBestAction> {
    let mut urgent: Vec<&NextBestAction> = deal
        .next_best_actions
        .iter()
        .filter(|action| !action.is_completed && action.priority.is_urgent())
        .collect();
    urgent.sort_by_key(|action| action.priority.rank());
    urgent
}

/// Today's actions across the portfolio: the urgent subset of every *active*
/// deal, flattened with deal/account display context, ordered by priority.
pub fn today_actions(deals: &[Deal]) -> Vec<PortfolioAction> {
    let mut flattened: Vec<PortfolioAction> = deals
        .iter()
        .filter(|deal| deal.stage.is_active())
        .flat_map(|deal| {
            urgent_actions(deal).into_iter().map(|action| PortfolioAction {
                deal_id: deal.id.clone(),
                deal_name: deal.name.clone(),
                account_name: deal.account_name.clone(),
                action: action.clone(),
            })
        })
        .collect();
    flattened.sort_by_key(|item| item.action.priority.rank());
    flattened
}

/// Deal-room ordering, where completed and incomplete actions appear
/// together: incomplete before complete, then priority.
pub fn deal_room_order(actions: &[NextBestAction]) -> Vec<NextBestAction> {
    let mut ordered = actions.to_vec();
    ordered.sort_by_key(|action| (action.is_completed, action.priority.rank()));
    ordered
}
