mod common;

use std::{cell::Cell, time::Duration};

use common::{create_test_database, create_test_executor, ORDER_COUNT};
use quarry_core::{
    CorrectionRequest, EngineBuilder, Executor, Plan, PlanBuilder, PlanSnapshot, SqliteExecutor,
    StepSpec, StepStatus, Value,
};

fn spending_chain(q2: &str) -> Plan {
    PlanBuilder::new()
        .step(
            StepSpec::new(
                "q1",
                "SELECT customer, SUM(amount) AS spent FROM orders GROUP BY customer",
            )
            .describe("Spend per customer"),
        )
        .step(
            StepSpec::new("q2", q2)
                .describe("Customers above 1000")
                .depends_on(["q1"]),
        )
        .step(
            StepSpec::new("q3", "SELECT COUNT(*) AS big_spenders FROM q2")
                .describe("Count them")
                .depends_on(["q2"]),
        )
        .final_step("q3")
        .question("How many customers spent more than 1000?")
        .build()
        .expect("valid plan")
}

#[test]
fn test_single_step_count() {
    let (_temp_dir, executor) = create_test_executor();
    let engine = EngineBuilder::new(executor).build().unwrap();

    let plan = engine.execute_owned(Plan::single("SELECT COUNT(*) FROM orders", None).unwrap());

    assert!(plan.is_complete());
    let result = plan.final_results().unwrap();
    assert_eq!(result.rows(), [vec![Value::Integer(ORDER_COUNT)]]);
}

#[test]
fn test_two_sources_feed_final_step() {
    let (_temp_dir, executor) = create_test_executor();
    let engine = EngineBuilder::new(executor).build().unwrap();

    let plan = Plan::from_json(
        r#"{
            "queries": [
                {"id": "q1", "sql": "SELECT SUM(amount) AS total FROM orders WHERE month = '2024-11'"},
                {"id": "q2", "sql": "SELECT SUM(amount) AS total FROM orders WHERE month = '2024-12'"},
                {
                    "id": "q3",
                    "description": "Month over month growth",
                    "sql": "SELECT (SELECT total FROM q2) - (SELECT total FROM q1) AS growth",
                    "depends_on": ["q1", "q2"]
                }
            ],
            "final_query_id": "q3"
        }"#,
    )
    .unwrap();
    let plan = engine.execute_owned(plan);

    assert_eq!(plan.execution_order_ids(), vec!["q1", "q2", "q3"]);
    assert!(plan.is_complete());
    let result = plan.final_results().unwrap();
    assert_eq!(result.columns(), ["growth"]);
    assert_eq!(result.rows(), [vec![Value::Real(250.0)]]);
}

#[test]
fn test_corrector_fixes_middle_step() {
    let (_temp_dir, executor) = create_test_executor();
    let calls = Cell::new(0);
    let corrector = |request: &CorrectionRequest<'_>| -> anyhow::Result<String> {
        calls.set(calls.get() + 1);
        assert_eq!(request.error, "no such column: spnt");
        Ok(format!("```sql\n{}\n```", request.query.replace("spnt", "spent")))
    };
    let engine = EngineBuilder::new(executor)
        .with_corrector(corrector)
        .build()
        .unwrap();

    let plan = engine.execute_owned(spending_chain("SELECT customer FROM q1 WHERE spnt > 1000"));

    assert_eq!(calls.get(), 1);
    let q2 = plan.step("q2").unwrap();
    assert_eq!(q2.status(), StepStatus::Completed);
    assert_eq!(q2.corrections().len(), 1);
    assert_eq!(q2.corrections()[0].error, "no such column: spnt");
    assert_eq!(q2.query(), "SELECT customer FROM q1 WHERE spent > 1000");
    assert_eq!(q2.result().unwrap().rows(), [vec![Value::from("alice")]]);

    assert_eq!(plan.step("q3").unwrap().status(), StepStatus::Completed);
    assert!(plan.is_complete());
    assert_eq!(plan.final_results().unwrap().rows(), [vec![Value::Integer(1)]]);
}

#[test]
fn test_broken_corrector_exhausts_budget() {
    let (_temp_dir, executor) = create_test_executor();
    let broken = "SELECT customer FROM q1 WHERE spnt > 1000";
    let corrector = |_: &CorrectionRequest<'_>| -> anyhow::Result<String> { Ok(broken.into()) };
    let engine = EngineBuilder::new(executor)
        .with_corrector(corrector)
        .with_max_corrections(2)
        .build()
        .unwrap();

    let plan = engine.execute_owned(spending_chain(broken));

    let q2 = plan.step("q2").unwrap();
    assert_eq!(q2.status(), StepStatus::Failed);
    assert_eq!(q2.attempts(), 3);
    assert_eq!(q2.error(), Some("no such column: spnt"));
    assert_eq!(plan.step("q1").unwrap().status(), StepStatus::Completed);
    assert_eq!(plan.step("q3").unwrap().status(), StepStatus::Pending);
    assert!(plan.has_errors());
    assert!(!plan.is_complete());
    assert!(plan.final_results().is_none());
}

#[test]
fn test_empty_dependency_aggregates_to_zero() {
    let (_temp_dir, executor) = create_test_executor();
    let engine = EngineBuilder::new(executor).build().unwrap();

    let plan = PlanBuilder::new()
        .step(StepSpec::new("q1", "SELECT * FROM orders WHERE month = '1999-01'"))
        .step(
            StepSpec::new("q2", "SELECT COUNT(*) AS n, SUM(amount) AS total FROM q1")
                .depends_on(["q1"]),
        )
        .build()
        .unwrap();
    let plan = engine.execute_owned(plan);

    assert!(plan.is_complete());
    let q1 = plan.step("q1").unwrap().result().unwrap();
    assert!(q1.is_empty());
    assert_eq!(q1.columns(), ["id", "customer", "month", "amount"]);
    assert_eq!(
        plan.final_results().unwrap().rows(),
        [vec![Value::Integer(0), Value::Null]]
    );
}

#[test]
fn test_queries_with_their_own_with_clause() {
    let (_temp_dir, executor) = create_test_executor();
    let engine = EngineBuilder::new(executor).build().unwrap();

    let plan = PlanBuilder::new()
        .step(StepSpec::new(
            "q1",
            "SELECT customer, SUM(amount) AS spent FROM orders GROUP BY customer",
        ))
        .step(
            StepSpec::new(
                "q2",
                "WITH big AS (SELECT * FROM q1 WHERE spent > 1000) SELECT customer FROM big",
            )
            .depends_on(["q1"]),
        )
        .step(
            StepSpec::new(
                "q3",
                "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n \
                 WHERE i < (SELECT COUNT(*) FROM q1)) SELECT COUNT(*) AS steps FROM n",
            )
            .depends_on(["q1"]),
        )
        .final_step("q3")
        .build()
        .unwrap();
    let plan = engine.execute_owned(plan);

    assert!(plan.is_complete(), "{plan}");
    assert_eq!(
        plan.step("q2").unwrap().result().unwrap().rows(),
        [vec![Value::from("alice")]]
    );
    assert_eq!(plan.final_results().unwrap().rows(), [vec![Value::Integer(3)]]);
}

#[test]
fn test_step_ids_need_not_be_plain_identifiers() {
    let (_temp_dir, executor) = create_test_executor();
    let engine = EngineBuilder::new(executor).build().unwrap();

    let plan = PlanBuilder::new()
        .step(StepSpec::new(
            "monthly totals",
            "SELECT month, SUM(amount) AS total FROM orders GROUP BY month",
        ))
        .step(
            StepSpec::new("best", "SELECT MAX(total) AS best FROM \"monthly totals\"")
                .depends_on(["monthly totals"]),
        )
        .build()
        .unwrap();
    let plan = engine.execute_owned(plan);

    assert!(plan.is_complete(), "{plan}");
    assert_eq!(plan.final_results().unwrap().rows(), [vec![Value::Real(1750.0)]]);
}

#[test]
fn test_large_dependency_is_inlined() {
    let (_temp_dir, executor) = create_test_executor();
    let engine = EngineBuilder::new(executor).build().unwrap();

    let plan = PlanBuilder::new()
        .step(StepSpec::new(
            "q1",
            "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 2000) \
             SELECT i FROM n",
        ))
        .step(StepSpec::new("q2", "SELECT COUNT(*), SUM(i) FROM q1").depends_on(["q1"]))
        .build()
        .unwrap();
    let plan = engine.execute_owned(plan);

    assert!(plan.is_complete(), "{plan}");
    assert_eq!(plan.step("q1").unwrap().row_count(), Some(2000));
    assert_eq!(
        plan.final_results().unwrap().rows(),
        [vec![Value::Integer(2000), Value::Integer(2_001_000)]]
    );
}

#[test]
fn test_final_result_row_cap() {
    let (_temp_dir, executor) = create_test_executor();
    let engine = EngineBuilder::new(executor)
        .with_max_results(3)
        .build()
        .unwrap();

    let plan = PlanBuilder::new()
        .step(StepSpec::new("q1", "SELECT * FROM orders"))
        .step(StepSpec::new("q2", "SELECT id FROM q1 ORDER BY id").depends_on(["q1"]))
        .build()
        .unwrap();
    let plan = engine.execute_owned(plan);

    assert_eq!(plan.step("q1").unwrap().row_count(), Some(4));
    let last = plan.final_step();
    assert!(last.is_truncated());
    assert_eq!(last.row_count(), Some(3));
    assert!(plan.snapshot().final_step().unwrap().truncated);
}

#[test]
fn test_writes_fail_without_correction() {
    let (_temp_dir, db_path) = create_test_database();
    let calls = Cell::new(0);
    let corrector = |_: &CorrectionRequest<'_>| -> anyhow::Result<String> {
        calls.set(calls.get() + 1);
        Ok("SELECT 1".into())
    };
    let engine = EngineBuilder::new(SqliteExecutor::open(&db_path).unwrap())
        .with_corrector(corrector)
        .build()
        .unwrap();

    let plan = engine.execute_owned(Plan::single("DELETE FROM orders", None).unwrap());

    assert!(plan.has_errors());
    assert_eq!(calls.get(), 0);

    let recount = SqliteExecutor::open(&db_path)
        .unwrap()
        .run("SELECT COUNT(*) FROM orders")
        .unwrap();
    assert_eq!(recount.rows(), [vec![Value::Integer(ORDER_COUNT)]]);
}

#[test]
fn test_timeout_is_not_retried() {
    let (_temp_dir, executor) = create_test_executor();
    let corrector = |_: &CorrectionRequest<'_>| -> anyhow::Result<String> {
        panic!("timeouts must not be corrected")
    };
    let engine = EngineBuilder::new(executor.with_step_timeout(Some(Duration::from_millis(50))))
        .with_corrector(corrector)
        .build()
        .unwrap();

    let plan = engine.execute_owned(
        Plan::single(
            "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n) SELECT COUNT(*) FROM n",
            None,
        )
        .unwrap(),
    );

    let step = plan.final_step();
    assert_eq!(step.status(), StepStatus::Failed);
    assert_eq!(step.attempts(), 1);
}

#[test]
fn test_snapshots_are_idempotent() {
    let (_temp_dir, executor) = create_test_executor();
    let engine = EngineBuilder::new(executor).build().unwrap();
    let plan = engine.execute_owned(spending_chain(
        "SELECT customer FROM q1 WHERE spent > 1000",
    ));

    assert_eq!(plan.snapshot(), plan.snapshot());
    assert_eq!(plan.to_value().unwrap(), plan.to_value().unwrap());
    let json = plan.to_json_pretty().unwrap();
    assert_eq!(json, plan.to_json_pretty().unwrap());

    let parsed: PlanSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.execution_order, vec!["q1", "q2", "q3"]);
    assert!(parsed.is_complete);
    assert_eq!(
        parsed.final_step().and_then(|step| step.result.clone()),
        plan.final_results().cloned()
    );

    let value = plan.to_value().unwrap();
    assert_eq!(value["steps"][0]["status"], "completed");
    assert_eq!(value["steps"][2]["result"]["rows"][0][0], 1);
}

#[test]
fn test_upstream_text_does_not_affect_classification() {
    let (_temp_dir, executor) = create_test_executor();
    let calls = Cell::new(0);
    let corrector = |request: &CorrectionRequest<'_>| -> anyhow::Result<String> {
        calls.set(calls.get() + 1);
        assert_eq!(request.error, "no such column: nte");
        Ok(request.query.replace("nte", "note"))
    };
    let engine = EngineBuilder::new(executor)
        .with_corrector(corrector)
        .build()
        .unwrap();

    let plan = PlanBuilder::new()
        .step(StepSpec::new(
            "q1",
            "SELECT 'permission denied for user bob' AS note",
        ))
        .step(StepSpec::new("q2", "SELECT nte FROM q1").depends_on(["q1"]))
        .build()
        .unwrap();
    let plan = engine.execute_owned(plan);

    assert_eq!(calls.get(), 1);
    assert!(plan.is_complete(), "{plan}");
    assert_eq!(
        plan.final_results().unwrap().rows(),
        [vec![Value::from("permission denied for user bob")]]
    );
}

#[test]
fn test_text_with_nul_is_inlined() {
    let (_temp_dir, executor) = create_test_executor();
    let engine = EngineBuilder::new(executor).build().unwrap();

    let plan = PlanBuilder::new()
        .step(StepSpec::new("q1", "SELECT char(97, 0, 98) AS t"))
        .step(
            StepSpec::new("q2", "SELECT t, length(CAST(t AS BLOB)) AS bytes FROM q1")
                .depends_on(["q1"]),
        )
        .build()
        .unwrap();
    let plan = engine.execute_owned(plan);

    assert!(plan.is_complete(), "{plan}");
    assert_eq!(
        plan.final_results().unwrap().rows(),
        [vec![Value::from("a\0b"), Value::Integer(3)]]
    );
}

#[test]
fn test_leading_comment_before_with_clause() {
    let (_temp_dir, executor) = create_test_executor();
    let engine = EngineBuilder::new(executor).build().unwrap();

    let plan = PlanBuilder::new()
        .step(StepSpec::new(
            "q1",
            "SELECT customer, SUM(amount) AS spent FROM orders GROUP BY customer",
        ))
        .step(
            StepSpec::new(
                "q2",
                "-- customers above 1000\n/* generated */ WITH big AS \
                 (SELECT * FROM q1 WHERE spent > 1000) SELECT COUNT(*) FROM big",
            )
            .depends_on(["q1"]),
        )
        .build()
        .unwrap();
    let plan = engine.execute_owned(plan);

    assert!(plan.is_complete(), "{plan}");
    assert_eq!(plan.final_results().unwrap().rows(), [vec![Value::Integer(1)]]);
}
