//! 看板视图 - 流程层
//!
//! 把"运行记录快照 + 测试用例"组装成看板需要的完整视图；
//! 订阅模式下每收到一次快照就从头重算一次

use futures::Stream;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::models::{Run, TestCase};
use crate::services::correlator::{correlate, summarize_projects, Correlation, ProjectSummary};

/// 看板视图
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub correlation: Correlation,
    pub projects: Vec<ProjectSummary>,
}

impl DashboardView {
    pub fn build(cases: &[TestCase], runs: &[Run]) -> Self {
        Self {
            correlation: correlate(cases, runs),
            projects: summarize_projects(runs),
        }
    }
}

/// 将运行记录订阅转换为看板视图流
///
/// 先产出当前快照对应的视图，之后每次快照变化产出一次；存储关闭时结束
pub fn view_stream(
    receiver: watch::Receiver<Vec<Run>>,
    cases: Vec<TestCase>,
) -> impl Stream<Item = DashboardView> {
    futures::stream::unfold((receiver, cases, true), |(mut rx, cases, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let runs = rx.borrow_and_update().clone();
        debug!("重算看板视图: {} 条运行记录", runs.len());
        let view = DashboardView::build(&cases, &runs);
        Some((view, (rx, cases, false)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunStatus;
    use chrono::Utc;
    use futures::StreamExt;

    fn run(id: &str, url: &str, status: RunStatus) -> Run {
        Run {
            id: id.to_string(),
            url: url.to_string(),
            prompt: "p".to_string(),
            status,
            timestamp: Utc::now(),
            transcript: Vec::new(),
            project_id: None,
            project_name: None,
            repo_url: None,
        }
    }

    #[tokio::test]
    async fn test_view_stream_recomputes_on_every_snapshot() {
        let cases = vec![TestCase::new("cart", "/cases/cart.html", "buy")];
        let (tx, rx) = watch::channel(vec![run("r1", "/cases/cart.html", RunStatus::Failure)]);

        let mut stream = Box::pin(view_stream(rx, cases));

        let first = stream.next().await.unwrap();
        assert_eq!(first.correlation.groups[0].failure, 1);
        assert_eq!(first.correlation.totals.success_rate, 0);

        // 整体替换快照，而不是增量追加
        tx.send_replace(vec![
            run("r2", "/cases/cart.html", RunStatus::Success),
            run("r3", "/elsewhere", RunStatus::Success),
        ]);
        let second = stream.next().await.unwrap();
        assert_eq!(second.correlation.groups[0].runs.len(), 1);
        assert_eq!(second.correlation.groups[0].runs[0].id, "r2");
        assert_eq!(second.correlation.unmatched.len(), 1);
        assert_eq!(second.correlation.totals.success_rate, 100);
        assert_eq!(second.projects.len(), 1);

        drop(tx);
        assert!(stream.next().await.is_none());
    }
}
