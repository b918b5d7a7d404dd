mod support;

use serde_json::{json, Value};

use ledgerlens_core::ErrorKind;
use ledgerlens_rpc::{InMemoryTransport, TransportResponse};
use ledgerlens_skills::metrics::Trend;
use ledgerlens_skills::skills::{
    CashPosition, ReceivablesAging, SalesComparison, SalesSummary, StockLevels, TopProducts,
};
use ledgerlens_skills::{default_registry, execute, SkillContext};

use support::{context, domain_value, fake_erp, is_grouped, limited};

#[tokio::test]
async fn sales_summary_reports_grand_total_and_skips_unset_customers() {
    let erp = fake_erp(|req| {
        if !is_grouped(req) {
            return json!([{"__count": 10, "amount_total": 10000.0}]);
        }
        limited(
            req,
            vec![
                json!({"partner_id": [1, "Azure Interior"], "partner_id_count": 6, "amount_total": 6000.0}),
                json!({"partner_id": false, "partner_id_count": 1, "amount_total": 500.0}),
                json!({"partner_id": [2, "Deco Addict"], "partner_id_count": 3, "amount_total": 3500.0}),
            ],
        )
    });
    let ctx = context(erp.clone());

    let report = execute(&SalesSummary, json!({"top_customers": 2}), &ctx)
        .await
        .into_result()
        .unwrap();

    assert_eq!(report.total_revenue, 10000.0);
    assert_eq!(report.order_count, 10);
    assert_eq!(report.average_order_value, 1000.0);
    assert_eq!(report.top_customers.len(), 2);
    assert_eq!(report.top_customers[0].customer, "Azure Interior");
    assert_eq!(report.top_customers[0].share_pct, Some(60.0));
    assert_eq!(report.top_customers[1].customer, "Deco Addict");
    assert_eq!(report.other_revenue, 500.0);
    assert!(report.top_customers.iter().all(|c| c.customer != "false"));

    let grouped = erp.requests().into_iter().find(is_grouped).unwrap();
    assert_eq!(grouped.model(), Some("sale.order"));
    assert_eq!(support::limit(&grouped), Some(3));
    assert_eq!(domain_value(&grouped, "state", "in"), Some(&json!(["sale", "done"])));
    assert_eq!(
        domain_value(&grouped, "date_order", ">="),
        Some(&json!("2024-03-01 00:00:00"))
    );
    assert_eq!(
        domain_value(&grouped, "date_order", "<="),
        Some(&json!("2024-03-31 23:59:59"))
    );
}

fn revenue_by_month(current: (u64, f64), previous: (u64, f64)) -> std::sync::Arc<InMemoryTransport> {
    fake_erp(move |req| {
        let (count, total) = match domain_value(req, "date_order", ">=").and_then(Value::as_str) {
            Some("2024-03-01 00:00:00") => current,
            Some("2024-02-01 00:00:00") => previous,
            _ => (0, 0.0),
        };
        json!([{"__count": count, "amount_total": total}])
    })
}

#[tokio::test]
async fn sales_comparison_fetches_both_periods_with_one_login() {
    let erp = revenue_by_month((4, 100_000.0), (2, 50_000.0));
    let ctx = context(erp.clone());

    let report = execute(&SalesComparison, Value::Null, &ctx).await.into_result().unwrap();

    assert_eq!(report.revenue.change_pct, Some(100.0));
    assert_eq!(report.revenue.trend, Trend::Up);
    assert_eq!(report.orders.change_pct, Some(100.0));
    assert_eq!(report.average_order_value.change_pct, Some(0.0));
    assert_eq!(report.average_order_value.trend, Trend::Stable);
    assert!(report.to_date);
    assert_eq!(report.current.period.end.to_string(), "2024-03-15");
    assert_eq!(report.previous.period.end.to_string(), "2024-02-15");

    assert_eq!(erp.login_count(), 1);
    assert_eq!(erp.count_where(|r| r.model_method() == Some("read_group")), 2);
}

#[tokio::test]
async fn sales_comparison_of_a_finished_month_uses_whole_months() {
    let erp = fake_erp(|req| {
        let (count, total) = match domain_value(req, "date_order", ">=").and_then(Value::as_str) {
            Some("2024-02-01 00:00:00") => (3, 30_000.0),
            Some("2024-01-01 00:00:00") => (3, 30_000.0),
            _ => (0, 0.0),
        };
        json!([{"__count": count, "amount_total": total}])
    });
    let ctx = context(erp.clone());

    let report = execute(&SalesComparison, json!({"period": "last_month"}), &ctx)
        .await
        .into_result()
        .unwrap();

    assert!(!report.to_date);
    assert_eq!(report.current.period.end.to_string(), "2024-02-29");
    assert_eq!(report.previous.period.end.to_string(), "2024-01-31");
    assert_eq!(report.revenue.trend, Trend::Stable);
    let upper_bounds: Vec<Value> = erp
        .requests()
        .iter()
        .filter_map(|r| domain_value(r, "date_order", "<=").cloned())
        .collect();
    assert!(upper_bounds.contains(&json!("2024-01-31 23:59:59")));
}

#[tokio::test]
async fn sales_comparison_from_an_empty_baseline() {
    let ctx = context(revenue_by_month((1, 5_000.0), (0, 0.0)));
    let report = execute(&SalesComparison, Value::Null, &ctx).await.into_result().unwrap();
    assert_eq!(report.revenue.change_pct, Some(100.0));
    assert_eq!(report.revenue.trend, Trend::Up);

    let ctx = context(revenue_by_month((0, 0.0), (0, 0.0)));
    let report = execute(&SalesComparison, Value::Null, &ctx).await.into_result().unwrap();
    assert_eq!(report.revenue.change_pct, None);
    assert_eq!(report.revenue.trend, Trend::Stable);
}

#[tokio::test]
async fn sales_comparison_reports_a_decline() {
    let ctx = context(revenue_by_month((2, 40_000.0), (5, 100_000.0)));
    let report = execute(&SalesComparison, Value::Null, &ctx).await.into_result().unwrap();
    assert_eq!(report.revenue.change_pct, Some(-60.0));
    assert_eq!(report.revenue.trend, Trend::Down);
}

#[tokio::test]
async fn receivables_aging_weights_by_amount() {
    let erp = fake_erp(|_| {
        json!([
            {"id": 1, "name": "INV/001", "partner_id": [7, "Deco Addict"],
             "invoice_date": "2024-03-01", "invoice_date_due": "2024-03-05", "amount_residual": 5000.0},
            {"id": 2, "name": "INV/002", "partner_id": [8, "Gemini Furniture"],
             "invoice_date": "2023-11-01", "invoice_date_due": "2023-12-06", "amount_residual": 1000.0},
            {"id": 3, "name": "INV/003", "partner_id": false,
             "invoice_date": "2024-03-15", "invoice_date_due": "2024-04-14", "amount_residual": 0.0}
        ])
    });
    let ctx = context(erp.clone());

    let report = execute(&ReceivablesAging, Value::Null, &ctx).await.into_result().unwrap();

    assert_eq!(report.weighted_average_age_days, Some(25));
    assert_eq!(report.total_outstanding, 6000.0);
    assert_eq!(report.overdue_amount, 6000.0);
    assert_eq!(report.invoice_count, 3);
    assert_eq!(report.buckets[0].amount, 5000.0);
    assert_eq!(report.buckets[0].count, 2);
    assert_eq!(report.buckets[3].amount, 1000.0);
    assert_eq!(report.top_debtors.len(), 2);
    assert_eq!(report.top_debtors[0].customer, "Deco Addict");
    assert_eq!(report.top_debtors[1].oldest_days, 100);

    let search = erp
        .requests()
        .into_iter()
        .find(|r| r.model_method() == Some("search_read"))
        .unwrap();
    assert_eq!(search.model(), Some("account.move"));
    assert!(search.kwargs().unwrap().get("limit").is_none());
    assert_eq!(domain_value(&search, "move_type", "="), Some(&json!("out_invoice")));
    assert_eq!(domain_value(&search, "state", "="), Some(&json!("posted")));
    assert_eq!(
        domain_value(&search, "payment_state", "in"),
        Some(&json!(["not_paid", "partial"]))
    );
}

#[tokio::test]
async fn stock_levels_flags_low_stock_and_truncation() {
    let erp = fake_erp(|req| {
        if !is_grouped(req) {
            return json!([{"__count": 5, "quantity": 30.0, "value": 1000.0}]);
        }
        limited(
            req,
            vec![
                json!({"product_id": [3, "Office Chair"], "product_id_count": 1, "quantity": 2.0, "value": 40.0}),
                json!({"product_id": [4, "Large Desk"], "product_id_count": 2, "quantity": 12.0, "value": 600.0}),
                json!({"product_id": [5, "Cabinet"], "product_id_count": 2, "quantity": 16.0, "value": 360.0}),
            ],
        )
    });
    let ctx = context(erp.clone());

    let report = execute(&StockLevels, json!({"low_stock_threshold": 5, "limit": 2}), &ctx)
        .await
        .into_result()
        .unwrap();

    assert_eq!(report.products.len(), 2);
    assert!(report.truncated);
    assert_eq!(report.total_quantity, 30.0);
    assert_eq!(report.total_value, 1000.0);
    assert_eq!(report.low_stock.len(), 1);
    assert_eq!(report.low_stock[0].product, "Office Chair");

    let grouped = erp.requests().into_iter().find(is_grouped).unwrap();
    assert_eq!(support::limit(&grouped), Some(3));
    assert_eq!(grouped.kwargs().unwrap()["orderby"], "quantity asc");
    assert_eq!(domain_value(&grouped, "location_id.usage", "="), Some(&json!("internal")));
}

#[tokio::test]
async fn stock_levels_lists_products_past_an_unset_one() {
    let erp = fake_erp(|req| {
        if !is_grouped(req) {
            return json!([{"__count": 4, "quantity": 20.0, "value": 500.0}]);
        }
        limited(
            req,
            vec![
                json!({"product_id": [4, "Large Desk"], "product_id_count": 2, "quantity": 12.0, "value": 400.0}),
                json!({"product_id": false, "product_id_count": 1, "quantity": 5.0, "value": 50.0}),
                json!({"product_id": [3, "Office Chair"], "product_id_count": 1, "quantity": 3.0, "value": 50.0}),
            ],
        )
    });

    let report = execute(&StockLevels, json!({"limit": 2}), &context(erp))
        .await
        .into_result()
        .unwrap();

    let names: Vec<&str> = report.products.iter().map(|p| p.product.as_str()).collect();
    assert_eq!(names, ["Large Desk", "Office Chair"]);
    // the unset-product quant is counted in the total but never listed
    assert!(report.truncated);
    assert_eq!(report.total_quantity, 20.0);
}

#[tokio::test]
async fn cash_position_totals_every_journal() {
    let erp = fake_erp(|req| {
        if !is_grouped(req) {
            return json!([{"__count": 9, "balance": 1710.5}]);
        }
        json!([
            {"journal_id": [2, "Cash"], "journal_id_count": 3, "balance": 200.0},
            {"journal_id": [1, "Bank"], "journal_id_count": 5, "balance": 1500.5},
            {"journal_id": false, "journal_id_count": 1, "balance": 10.0}
        ])
    });
    let ctx = context(erp.clone());

    let report = execute(&CashPosition, json!({"as_of": "2024-03-10"}), &ctx)
        .await
        .into_result()
        .unwrap();

    assert_eq!(report.total_cash, 1710.5);
    assert_eq!(report.journals.len(), 2);
    assert_eq!(report.journals[0].journal, "Bank");
    assert_eq!(report.as_of.to_string(), "2024-03-10");

    let grouped = erp.requests().into_iter().find(is_grouped).unwrap();
    assert!(grouped.kwargs().unwrap().get("limit").is_none());
    assert_eq!(domain_value(&grouped, "date", "<="), Some(&json!("2024-03-10")));
}

fn product_lines() -> std::sync::Arc<InMemoryTransport> {
    fake_erp(|req| {
        let groups = vec![
            json!({"product_id": [10, "Desk"], "product_id_count": 4, "price_subtotal": 400.0, "product_uom_qty": 4.0}),
            json!({"product_id": [11, "Chair"], "product_id_count": 3, "price_subtotal": 300.0, "product_uom_qty": 6.0}),
            json!({"product_id": [12, "Lamp"], "product_id_count": 2, "price_subtotal": 200.0, "product_uom_qty": 8.0}),
            json!({"product_id": [13, "Pen"], "product_id_count": 1, "price_subtotal": 100.0, "product_uom_qty": 50.0}),
        ];
        if is_grouped(req) {
            return limited(req, groups);
        }
        let revenue: f64 = groups.iter().map(|g| g["price_subtotal"].as_f64().unwrap()).sum();
        let qty: f64 = groups.iter().map(|g| g["product_uom_qty"].as_f64().unwrap()).sum();
        json!([{"__count": 10, "price_subtotal": revenue, "product_uom_qty": qty}])
    })
}

#[tokio::test]
async fn top_products_total_does_not_depend_on_the_limit() {
    let limited_run = execute(&TopProducts, json!({"limit": 2}), &context(product_lines()))
        .await
        .into_result()
        .unwrap();
    let full_run = execute(&TopProducts, json!({"limit": 100}), &context(product_lines()))
        .await
        .into_result()
        .unwrap();

    assert_eq!(limited_run.products.len(), 2);
    assert_eq!(full_run.products.len(), 4);
    assert_eq!(limited_run.total_revenue, full_run.total_revenue);
    assert_eq!(limited_run.total_revenue, 1000.0);
    assert_eq!(limited_run.products[0].rank, 1);
    assert_eq!(limited_run.products[0].share_pct, Some(40.0));
    assert_eq!(limited_run.other_revenue, 300.0);
    assert_eq!(full_run.other_revenue, 0.0);
}

#[tokio::test]
async fn top_products_fills_the_ranking_past_an_unset_product() {
    let erp = fake_erp(|req| {
        let groups = vec![
            json!({"product_id": false, "product_id_count": 5, "price_subtotal": 900.0, "product_uom_qty": 9.0}),
            json!({"product_id": [10, "Desk"], "product_id_count": 4, "price_subtotal": 400.0, "product_uom_qty": 4.0}),
            json!({"product_id": [11, "Chair"], "product_id_count": 3, "price_subtotal": 300.0, "product_uom_qty": 6.0}),
            json!({"product_id": [12, "Lamp"], "product_id_count": 2, "price_subtotal": 200.0, "product_uom_qty": 8.0}),
        ];
        if is_grouped(req) {
            return limited(req, groups);
        }
        json!([{"__count": 14, "price_subtotal": 1800.0, "product_uom_qty": 27.0}])
    });

    let report = execute(&TopProducts, json!({"limit": 2}), &context(erp))
        .await
        .into_result()
        .unwrap();

    let names: Vec<&str> = report.products.iter().map(|p| p.product.as_str()).collect();
    assert_eq!(names, ["Desk", "Chair"]);
    assert_eq!(report.products[1].rank, 2);
    assert_eq!(report.total_revenue, 1800.0);
    assert_eq!(report.other_revenue, 1100.0);
}

#[tokio::test]
async fn missing_integration_fails_before_any_call() {
    let erp = fake_erp(|_| json!([]));
    let ctx = SkillContext::new(Default::default(), Default::default(), erp.clone());

    let outcome = execute(&SalesSummary, Value::Null, &ctx).await;
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.code, ErrorKind::Auth);
    assert!(failure.message.contains("erp"));
    assert!(erp.requests().is_empty());
}

#[tokio::test]
async fn invalid_input_never_reaches_the_network() {
    let erp = fake_erp(|_| json!([]));
    let ctx = context(erp.clone());

    for input in [
        json!({"top_customers": 0}),
        json!({"period": "fortnight"}),
        json!({"date_from": "2024-03-10", "date_to": "2024-03-01"}),
        json!({"surprise": true}),
    ] {
        let outcome = execute(&SalesSummary, input.clone(), &ctx).await;
        assert_eq!(outcome.failure().map(|f| f.code), Some(ErrorKind::Validation), "{input}");
    }
    assert!(erp.requests().is_empty());
}

#[tokio::test]
async fn access_errors_become_guided_failures() {
    let erp = std::sync::Arc::new(InMemoryTransport::new(|req| {
        if req.is_login() {
            return Ok(TransportResponse::rpc_result(json!(2)));
        }
        Ok(TransportResponse::rpc_error(
            "odoo.exceptions.AccessError",
            "You are not allowed to access 'Journal Entry' (account.move) records.",
        ))
    }));
    let ctx = context(erp);

    let registry = default_registry().unwrap();
    let outcome = registry.invoke("receivables_aging", Value::Null, &ctx).await;
    let body = serde_json::to_value(&outcome).unwrap();

    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "ACCESS_DENIED");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("account.move"));
    assert!(message.contains("administrator"));
}

#[tokio::test]
async fn rejected_login_names_database_and_user_only() {
    let erp = std::sync::Arc::new(InMemoryTransport::new(|_| Ok(TransportResponse::rpc_result(json!(false)))));
    let ctx = context(erp);

    let outcome = execute(&CashPosition, Value::Null, &ctx).await;
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.code, ErrorKind::Auth);
    assert!(failure.message.contains("acme"));
    assert!(failure.message.contains("bot@acme.test"));
    assert!(!failure.message.contains("s3cret"));
}

#[test]
fn default_registry_describes_every_builtin() {
    let registry = default_registry().unwrap();
    let descriptors = registry.descriptors();
    let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "sales_summary",
            "receivables_aging",
            "sales_comparison",
            "stock_levels",
            "cash_position",
            "top_products"
        ]
    );

    let summary = serde_json::to_value(&descriptors[0]).unwrap();
    assert!(summary["tags"].as_array().unwrap().contains(&json!("sales")));
    let period = summary["input_schema"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "period")
        .unwrap();
    assert_eq!(period["default"], "this_month");
}
