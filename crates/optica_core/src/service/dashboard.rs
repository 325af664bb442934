//! Read-only dashboard figures derived from the entity store.

use crate::model::order::OrderStatus;
use crate::store::EntityStore;

/// Display name for orders whose patient no longer exists.
pub const UNKNOWN_PATIENT_NAME: &str = "Paciente desconocido";
pub const RECENT_ORDERS_LIMIT: usize = 5;
pub const REVENUE_SERIES_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct RecentOrder {
    pub order_id: String,
    pub patient_name: String,
    pub date: String,
    pub amount: f64,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenuePoint {
    pub date: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub patient_count: usize,
    /// Orders neither delivered nor cancelled.
    pub active_orders: usize,
    /// Revenue per order rounded to a whole unit; `0` without orders.
    pub average_ticket: f64,
    /// Most recently appended orders first.
    pub recent_orders: Vec<RecentOrder>,
    /// Amounts of the last appended orders, oldest first.
    pub revenue_series: Vec<RevenuePoint>,
}

pub fn summarize(store: &EntityStore) -> DashboardSummary {
    let orders = store.orders();
    let total_revenue: f64 = orders.iter().map(|order| order.amount).sum();
    let average_ticket = if orders.is_empty() {
        0.0
    } else {
        (total_revenue / orders.len() as f64).round()
    };

    let recent_orders = orders
        .iter()
        .rev()
        .take(RECENT_ORDERS_LIMIT)
        .map(|order| RecentOrder {
            order_id: order.id.clone(),
            patient_name: store
                .patient_for_order(order)
                .name_or(UNKNOWN_PATIENT_NAME)
                .to_string(),
            date: order.date.clone(),
            amount: order.amount,
            status: order.status,
        })
        .collect();

    let series_start = orders.len().saturating_sub(REVENUE_SERIES_LEN);
    let revenue_series = orders[series_start..]
        .iter()
        .map(|order| RevenuePoint {
            date: order.date.clone(),
            amount: order.amount,
        })
        .collect();

    DashboardSummary {
        total_revenue,
        patient_count: store.patients().len(),
        active_orders: orders
            .iter()
            .filter(|order| order.status.is_active())
            .count(),
        average_ticket,
        recent_orders,
        revenue_series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::order::Order;
    use crate::model::patient::Patient;

    fn order(id: &str, patient_id: &str, amount: f64, status: OrderStatus) -> Order {
        let mut order = Order::with_id(id, patient_id, "", amount);
        order.status = status;
        order
    }

    #[test]
    fn empty_store_yields_zeroes() {
        let summary = summarize(&EntityStore::new());
        assert_eq!(summary.total_revenue, 0.0);
        assert_eq!(summary.average_ticket, 0.0);
        assert_eq!(summary.active_orders, 0);
        assert!(summary.recent_orders.is_empty());
        assert!(summary.revenue_series.is_empty());
    }

    #[test]
    fn totals_and_active_orders_follow_status() {
        let store = EntityStore::from_parts(
            vec![Patient::with_id("p1", "Ana", "555")],
            vec![
                order("o1", "p1", 100.0, OrderStatus::Pending),
                order("o2", "p1", 50.0, OrderStatus::Delivered),
                order("o3", "p1", 51.0, OrderStatus::Cancelled),
                order("o4", "gone", 0.0, OrderStatus::Ready),
            ],
        );
        let summary = summarize(&store);
        assert_eq!(summary.total_revenue, 201.0);
        assert_eq!(summary.patient_count, 1);
        assert_eq!(summary.active_orders, 2);
        assert_eq!(summary.average_ticket, 50.0);
    }

    #[test]
    fn recent_orders_are_newest_first_and_resolve_orphans() {
        let orders = (1..=7)
            .map(|n| order(&format!("o{n}"), "p1", n as f64, OrderStatus::Pending))
            .chain(std::iter::once(order("o8", "gone", 8.0, OrderStatus::Ready)))
            .collect();
        let store = EntityStore::from_parts(vec![Patient::with_id("p1", "Ana", "555")], orders);
        let summary = summarize(&store);

        let ids: Vec<_> = summary
            .recent_orders
            .iter()
            .map(|recent| recent.order_id.as_str())
            .collect();
        assert_eq!(ids, vec!["o8", "o7", "o6", "o5", "o4"]);
        assert_eq!(summary.recent_orders[0].patient_name, UNKNOWN_PATIENT_NAME);
        assert_eq!(summary.recent_orders[1].patient_name, "Ana");

        let series: Vec<_> = summary.revenue_series.iter().map(|p| p.amount).collect();
        assert_eq!(series, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }
}
