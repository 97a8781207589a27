//! 运行记录与测试用例的关联统计
//!
//! 每次都从完整快照重新计算，不做缓存

use serde::Serialize;
use url::Url;

use crate::models::{project_id_of, Project, Run, RunStatus, TestCase};

/// 单个测试用例下的运行记录
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRuns {
    pub case: TestCase,
    /// 保持输入顺序（通常为时间倒序）
    pub runs: Vec<Run>,
    pub success: usize,
    pub failure: usize,
}

/// 成功/失败汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    /// 成功率百分比，四舍五入
    pub success_rate: u32,
}

impl Totals {
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a Run>) -> Self {
        let mut totals = Totals::default();
        for run in runs {
            totals.add(run.status);
        }
        totals.finish()
    }

    fn add(&mut self, status: RunStatus) {
        self.total += 1;
        match status {
            RunStatus::Success => self.success += 1,
            RunStatus::Failure => self.failure += 1,
            RunStatus::InProgress | RunStatus::Queued => {}
        }
    }

    fn finish(mut self) -> Self {
        self.success_rate = if self.total == 0 {
            0
        } else {
            (self.success as f64 / self.total as f64 * 100.0).round() as u32
        };
        self
    }
}

/// 关联结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    /// 与测试用例一一对应，顺序与输入相同
    pub groups: Vec<CaseRuns>,
    /// 未匹配任何测试用例的运行记录
    pub unmatched: Vec<Run>,
    pub totals: Totals,
}

/// 项目维度的统计
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project: Project,
    pub total: usize,
    pub success: usize,
    pub failure: usize,
}

/// 将 URL 规范化为 path + query
///
/// 去掉协议、主机和锚点；相对地址按站内路径处理
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let parsed = Url::parse(raw).or_else(|_| Url::parse("http://localhost/")?.join(raw));

    match parsed {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        Err(_) => raw.to_string(),
    }
}

/// 按规范化 URL 关联运行记录与测试用例
///
/// 运行记录归入第一个"规范化 URL 是其子串"的测试用例；都不匹配则放入 `unmatched`
pub fn correlate(cases: &[TestCase], runs: &[Run]) -> Correlation {
    let case_urls: Vec<String> = cases.iter().map(|c| normalize_url(&c.starting_url)).collect();

    let mut groups: Vec<CaseRuns> = cases
        .iter()
        .map(|case| CaseRuns {
            case: case.clone(),
            runs: Vec::new(),
            success: 0,
            failure: 0,
        })
        .collect();
    let mut unmatched = Vec::new();

    for run in runs {
        let run_url = normalize_url(&run.url);
        match case_urls.iter().position(|case_url| run_url.contains(case_url.as_str())) {
            Some(idx) => {
                let group = &mut groups[idx];
                match run.status {
                    RunStatus::Success => group.success += 1,
                    RunStatus::Failure => group.failure += 1,
                    RunStatus::InProgress | RunStatus::Queued => {}
                }
                group.runs.push(run.clone());
            }
            None => unmatched.push(run.clone()),
        }
    }

    Correlation {
        groups,
        unmatched,
        totals: Totals::from_runs(runs),
    }
}

/// 按项目分组统计，顺序为首次出现的顺序
pub fn summarize_projects(runs: &[Run]) -> Vec<ProjectSummary> {
    let mut summaries: Vec<ProjectSummary> = Vec::new();

    for run in runs {
        let project_id = project_id_of(run);
        let idx = match summaries.iter().position(|s| s.project.id == project_id) {
            Some(idx) => idx,
            None => {
                summaries.push(ProjectSummary {
                    project: Project::from_run(run),
                    total: 0,
                    success: 0,
                    failure: 0,
                });
                summaries.len() - 1
            }
        };

        let summary = &mut summaries[idx];
        if summary.project.repo_url.is_none() {
            summary.project.repo_url = run.repo_url.clone();
        }
        summary.total += 1;
        match run.status {
            RunStatus::Success => summary.success += 1,
            RunStatus::Failure => summary.failure += 1,
            RunStatus::InProgress | RunStatus::Queued => {}
        }
    }

    summaries
}
