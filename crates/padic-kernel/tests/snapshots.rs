//! JSON snapshots of the serialized kernel outputs.

use insta::assert_json_snapshot;
use padic_kernel::{DigitExtractor, GateCase, LocalRationals, Prime, run_case};

#[test]
fn tower_of_minus_one_in_z3() {
    let q = LocalRationals::new(Prime::new(3).unwrap());
    let tower = DigitExtractor::new(q).tower(&q.integer(-1), 3).unwrap();
    assert_json_snapshot!(tower, @r###"
    [
      {
        "prime": 3,
        "level": 0,
        "value": "0"
      },
      {
        "prime": 3,
        "level": 1,
        "value": "2"
      },
      {
        "prime": 3,
        "level": 2,
        "value": "8"
      },
      {
        "prime": 3,
        "level": 3,
        "value": "26"
      }
    ]
    "###);
}

#[test]
fn rejected_kernel_check() {
    let case: GateCase = serde_json::from_value(serde_json::json!({
        "prime": 3,
        "family": "square",
        "check": {"kind": "kernel", "value": "3", "level": 2, "tokenPath": "value"}
    }))
    .unwrap();
    let result = run_case(&case, "padic").unwrap();
    assert_json_snapshot!(result, @r###"
    {
      "witnessSchema": 1,
      "profile": "padic",
      "result": "rejected",
      "failures": [
        {
          "witnessId": "w1_8bau9h4tbrrgnooln6an42t6no7m106nqpuf139j59creut8u3v0",
          "class": "kernel_failure",
          "lawRef": "TOWER-5",
          "message": "f(2)(x) = 0 mod 3^2, but x in (p^2) is false",
          "context": {
            "level": 2
          },
          "tokenPath": "value"
        }
      ]
    }
    "###);
}
