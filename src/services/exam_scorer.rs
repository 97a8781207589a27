//! 测验评分 - 纯函数
//!
//! 五道题各自独立判分，每题 1 分，满分 5 分

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 满分
pub const MAX_SCORE: u8 = 5;

const Q1_ANSWER: &str = "4";
const Q2_ANSWER: [&str; 3] = ["2", "3", "5"];
const Q3_ANSWER: [&str; 2] = ["2", "4"];
const Q4_ANSWER: &str = "12";
const Q5_ANSWER: &str = "9";

/// 测验作答
///
/// - q1: 单选
/// - q2 / q3: 多选，选中的集合必须与正确集合完全一致
/// - q4 / q5: 数字填空，精确匹配
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamAnswers {
    #[serde(default)]
    pub q1: Option<String>,
    #[serde(default)]
    pub q2: BTreeSet<String>,
    #[serde(default)]
    pub q3: BTreeSet<String>,
    #[serde(default)]
    pub q4: String,
    #[serde(default)]
    pub q5: String,
}

/// 评分结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamScore {
    pub score: u8,
    pub total: u8,
    /// 每题是否答对，按题号顺序
    pub breakdown: [bool; 5],
}

impl ExamAnswers {
    /// 所有题目都已作答时才允许提交
    pub fn is_complete(&self) -> bool {
        self.q1.as_deref().is_some_and(|v| !v.trim().is_empty())
            && !self.q2.is_empty()
            && !self.q3.is_empty()
            && !self.q4.trim().is_empty()
            && !self.q5.trim().is_empty()
    }

    pub fn score(&self) -> ExamScore {
        let breakdown = [
            self.q1.as_deref().map(str::trim) == Some(Q1_ANSWER),
            set_equals(&self.q2, &Q2_ANSWER),
            set_equals(&self.q3, &Q3_ANSWER),
            self.q4.trim() == Q4_ANSWER,
            self.q5.trim() == Q5_ANSWER,
        ];
        let score = breakdown.iter().filter(|&&correct| correct).count() as u8;

        ExamScore {
            score,
            total: MAX_SCORE,
            breakdown,
        }
    }
}

fn set_equals(selected: &BTreeSet<String>, expected: &[&str]) -> bool {
    let expected: BTreeSet<&str> = expected.iter().copied().collect();
    let selected: BTreeSet<&str> = selected.iter().map(|s| s.trim()).collect();
    selected == expected
}
