use std::fs;

use codejudge::{
    Judge, JudgeConfig, TestOutcome,
    config::CompilerConfig,
    report::Console,
};
use uuid::Uuid;

const PROGRAM: &str = r#"#include <cstdio>
int main() {
    double a, b;
    if (std::scanf("%lf %lf", &a, &b) != 2) return 1;
    std::printf("Average: %.2f\n", (a + b) / 2.0);
    return 0;
}
"#;

/// Compiles and runs real programs; skipped when no C++ compiler is
/// installed.
#[test]
fn real_compiler_round_trip() {
    if which::which("g++").is_err() {
        eprintln!("g++ not found; skipping");
        return;
    }

    let root = std::env::temp_dir().join(format!("codejudge-gxx-{}", Uuid::new_v4()));
    let subs = root.join("submissions");
    let cases = root.join("testcases");
    fs::create_dir_all(&subs).expect("create submissions");
    for (name, input, expected) in [("1", "1 2", "1.50"), ("2", "3 4", "The mean is 3.50.")] {
        fs::create_dir_all(cases.join(name)).expect("create fixture");
        fs::write(cases.join(name).join("input.txt"), input).expect("write input");
        fs::write(cases.join(name).join("expected_output.txt"), expected).expect("write expected");
    }
    fs::write(subs.join("good.cpp"), PROGRAM).expect("write good");
    fs::write(subs.join("bad.cpp"), "int main() { return 0 }").expect("write bad");

    let config = JudgeConfig::builder()
        .submissions_dir(subs)
        .fixtures_dir(cases)
        .workspace_dir(root.join("workspace"))
        .compiler(CompilerConfig::new("g++", vec![]))
        .build();
    let report = Judge::from_config(config)
        .expect("judge")
        .with_console(Console::quiet())
        .run()
        .expect("run");

    let good = report.get("good").expect("good");
    assert!(good.is_compiled());
    assert!(good.tests().iter().all(|t| t.outcome == TestOutcome::Passed));

    let bad = report.get("bad").expect("bad");
    assert!(!bad.is_compiled());
    assert!(bad.escalation().is_some_and(|j| j.failure.is_some()));

    let _ = fs::remove_dir_all(root);
}
