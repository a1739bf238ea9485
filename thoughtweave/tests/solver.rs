//! Integration tests: `Solver` end to end, with scripted collaborators and with
//! the LLM-backed generator/evaluator over `MockLlm`.

mod common;

use std::sync::Arc;

use common::{step, train_problem, ScriptedEvaluator, ScriptedGenerator};
use thoughtweave::{
    ConfigError, LlmEvaluator, LlmGenerator, MockLlm, SearchConfig, SearchEvent,
    SearchOutcomeKind, SolveError, Solver,
};

#[tokio::test]
async fn solve_returns_answer_and_path() {
    let gen = Arc::new(ScriptedGenerator::new(vec![vec![step("multiply")]]));
    let eval = Arc::new(ScriptedEvaluator::new(90.0));
    let solver = Solver::new(gen.clone(), eval, SearchConfig::default()).unwrap();

    let solution = solver.solve(train_problem()).await.unwrap();

    assert_eq!(solution.answer, "got multiply");
    assert_eq!(solution.outcome, SearchOutcomeKind::Accepted);
    assert_eq!(solution.path.len(), 2);
    assert_eq!(solution.path[0].depth, 0);
    assert_eq!(solution.path[0].score, None);
    assert_eq!(solution.path[0].step.thought, "A train travels 60 mph for 2 hours");
    assert_eq!(solution.path[1].step, step("multiply"));
    assert_eq!(solution.path[1].score, Some(0.9));
    assert_eq!(solution.stats.nodes, 2);
    assert_eq!(solution.stats.evaluations, 1);
    assert_eq!(solution.stats.iterations, 1);
}

/// **Scenario**: an unknown strategy fails before any collaborator is called.
#[tokio::test]
async fn unsupported_strategy_is_rejected_up_front() {
    let gen = Arc::new(ScriptedGenerator::new(vec![vec![step("multiply")]]));
    let eval = Arc::new(ScriptedEvaluator::new(90.0));
    let solver = Solver::new(gen.clone(), eval.clone(), SearchConfig::default()).unwrap();

    let err = solver.solve_with("mcts", train_problem()).await.unwrap_err();

    assert!(matches!(
        err,
        SolveError::Config(ConfigError::UnsupportedStrategy(ref s)) if s == "mcts"
    ));
    assert!(gen.requests().is_empty());
    assert!(eval.requests().is_empty());
}

#[test]
fn invalid_config_is_rejected_by_new() {
    let gen = Arc::new(ScriptedGenerator::new(Vec::new()));
    let eval = Arc::new(ScriptedEvaluator::new(0.0));
    let config = SearchConfig {
        path_threshold: 1.2,
        ..SearchConfig::default()
    };
    assert!(matches!(
        Solver::new(gen, eval, config),
        Err(ConfigError::OutOfRange {
            field: "path_threshold",
            ..
        })
    ));
}

#[tokio::test]
async fn events_end_with_finished() {
    let gen = Arc::new(ScriptedGenerator::new(vec![vec![step("multiply")]]));
    let eval = Arc::new(ScriptedEvaluator::new(90.0));
    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let solver = Solver::new(gen, eval, SearchConfig::default())
        .unwrap()
        .with_events(tx);

    solver.solve(train_problem()).await.unwrap();
    drop(solver);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert!(matches!(
        events.first(),
        Some(SearchEvent::ExpansionStarted { depth: 0, .. })
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, SearchEvent::LeafMarked { .. })));
    assert!(matches!(
        events.last(),
        Some(SearchEvent::Finished {
            outcome: SearchOutcomeKind::Accepted,
            iterations: 1,
            ..
        })
    ));
}

#[tokio::test]
async fn solution_serializes_flat_steps() {
    let gen = Arc::new(ScriptedGenerator::new(vec![vec![step("multiply")]]));
    let eval = Arc::new(ScriptedEvaluator::new(90.0));
    let solver = Solver::new(gen, eval, SearchConfig::default()).unwrap();

    let solution = solver.solve(train_problem()).await.unwrap();
    let v = serde_json::to_value(&solution).unwrap();

    assert_eq!(v["outcome"], "accepted");
    assert_eq!(v["path"][1]["thought"], "multiply");
    assert_eq!(v["path"][1]["result"], "got multiply");
    assert!(v["path"][0]["score"].is_null());
    assert_eq!(v["stats"]["nodes"], 2);
}

/// **Scenario**: LLM-backed collaborators over mock models solve the train problem.
#[tokio::test]
async fn llm_collaborators_solve_end_to_end() {
    let gen_llm = Arc::new(MockLlm::scripted([
        "Step 2:\nThought: distance is speed times time\nAction: 60 * 2\nResult: 120 miles",
        "{'Final Answer': 120 miles}",
    ]));
    let eval_llm = Arc::new(MockLlm::fixed("Final Score: 90\nHint: correct"));
    let solver = Solver::new(
        Arc::new(LlmGenerator::new(gen_llm.clone())),
        Arc::new(LlmEvaluator::new(eval_llm.clone())),
        SearchConfig::default(),
    )
    .unwrap();

    let solution = solver.solve(train_problem()).await.unwrap();

    assert_eq!(solution.answer, "120 miles");
    assert_eq!(solution.outcome, SearchOutcomeKind::Accepted);
    assert_eq!(solution.path[1].step.result, "120 miles");
    assert_eq!(gen_llm.call_count(), 2);
    assert_eq!(eval_llm.call_count(), 1);
}
