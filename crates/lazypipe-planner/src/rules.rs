//! Order-preserving rewrites over the step list.
//!
//! Every rule keeps the output identical, items and order:
//! - `sort(by, desc)` then `limit(n)` becomes `top_k(n, by, desc)` (n > 0).
//!   Top-K breaks ties by arrival, which is what a stable sort does.
//! - adjacent `limit(a)`, `limit(b)` fold to `limit(min(a, b))`.
//! - `top_k(k)` then `limit(n)` becomes `top_k(min(k, n))`.
//! - adjacent `skip(a)`, `skip(b)` fold to `skip(a + b)`.

use crate::dsl::yaml::Step;

/// Apply rewrites until none matches. Returns the new steps and a note per
/// rewrite applied.
pub fn optimize(steps: Vec<Step>) -> (Vec<Step>, Vec<String>) {
    let mut notes = Vec::new();
    let mut out: Vec<Step> = Vec::with_capacity(steps.len());
    for step in steps {
        let mut step = step;
        // A merge can enable another merge with the new last step.
        while let Some(prev) = out.pop() {
            match merge(prev, step) {
                Ok((merged, note)) => {
                    notes.push(note);
                    step = merged;
                }
                Err((prev, next)) => {
                    out.push(prev);
                    step = next;
                    break;
                }
            }
        }
        out.push(step);
    }
    (out, notes)
}

fn merge(prev: Step, next: Step) -> Result<(Step, String), (Step, Step)> {
    match (prev, next) {
        (Step::Sort { by, desc }, Step::Limit { n }) if n > 0 => Ok((
            Step::TopK { k: n, by, desc },
            format!("sort + limit({n}) -> top_k({n})"),
        )),
        (Step::Limit { n: a }, Step::Limit { n: b }) => Ok((
            Step::Limit { n: a.min(b) },
            format!("limit({a}) + limit({b}) -> limit({})", a.min(b)),
        )),
        (Step::TopK { k, by, desc }, Step::Limit { n }) if n > 0 => Ok((
            Step::TopK {
                k: k.min(n),
                by,
                desc,
            },
            format!("top_k({k}) + limit({n}) -> top_k({})", k.min(n)),
        )),
        (Step::Skip { n: a }, Step::Skip { n: b }) => Ok((
            Step::Skip { n: a.saturating_add(b) },
            format!("skip({a}) + skip({b}) -> skip({})", a.saturating_add(b)),
        )),
        (prev, next) => Err((prev, next)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_then_limit_becomes_top_k() {
        let (steps, notes) = optimize(vec![
            Step::Sort {
                by: "key".into(),
                desc: true,
            },
            Step::Limit { n: 3 },
        ]);
        assert_eq!(
            steps,
            vec![Step::TopK {
                k: 3,
                by: "key".into(),
                desc: true
            }]
        );
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn limits_fold_transitively() {
        let (steps, notes) = optimize(vec![
            Step::Sort {
                by: "value".into(),
                desc: false,
            },
            Step::Limit { n: 5 },
            Step::Limit { n: 2 },
        ]);
        assert_eq!(
            steps,
            vec![Step::TopK {
                k: 2,
                by: "value".into(),
                desc: false
            }]
        );
        assert_eq!(notes.len(), 2);
    }

    #[test]
    fn zero_limit_after_sort_is_kept() {
        let input = vec![
            Step::Sort {
                by: "value".into(),
                desc: false,
            },
            Step::Limit { n: 0 },
        ];
        let (steps, notes) = optimize(input.clone());
        assert_eq!(steps, input);
        assert!(notes.is_empty());
    }

    #[test]
    fn unrelated_steps_are_untouched() {
        let input = vec![Step::Skip { n: 1 }, Step::Flip, Step::Skip { n: 2 }];
        assert_eq!(optimize(input.clone()).0, input);
        assert_eq!(
            optimize(vec![Step::Skip { n: 1 }, Step::Skip { n: 2 }]).0,
            vec![Step::Skip { n: 3 }]
        );
    }
}
