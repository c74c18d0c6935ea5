//! 作业 API

use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::client::Commcell;
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::{JobDetails, JobRef, JobSubmission};
use crate::response::{int_field, str_field};
use crate::services::Service;
use crate::wrap::WrapOptions;

/// 作业 API
pub struct JobsApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> JobsApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 获取作业句柄
    pub fn job(&self, job: JobRef) -> Job<'a> {
        Job {
            commcell: self.commcell,
            job,
        }
    }
}

/// 单个作业
pub struct Job<'a> {
    commcell: &'a Commcell,
    job: JobRef,
}

impl<'a> Job<'a> {
    pub fn id(&self) -> i64 {
        self.job.id
    }

    /// 查询作业摘要
    pub async fn details(&self) -> Result<JobDetails> {
        info!("查询作业详情: {}", self.job);
        let value = self
            .commcell
            .wrap_request(
                Method::GET,
                Service::Job,
                &[&self.job.id.to_string()],
                WrapOptions::new(),
            )
            .await?;
        parse_job_details(self.job.id, &value)
    }
}

fn parse_job_details(job_id: i64, value: &Value) -> Result<JobDetails> {
    let no_record = || {
        SdkError::with_message(
            ErrorModule::Job,
            102,
            format!("No record found for job {}", job_id),
        )
    };

    if int_field(value, "totalRecordsWithoutPaging") == Some(0) {
        return Err(no_record());
    }
    let summary = value
        .pointer("/jobs/0/jobSummary")
        .ok_or_else(no_record)?;

    Ok(JobDetails {
        id: int_field(summary, "jobId").unwrap_or(job_id),
        status: str_field(summary, "status").unwrap_or_default(),
        job_type: str_field(summary, "jobType").unwrap_or_default(),
        client_name: summary
            .pointer("/subclient/clientName")
            .and_then(Value::as_str)
            .map(str::to_string),
        percent_complete: int_field(summary, "percentComplete"),
        raw: summary.clone(),
    })
}

/// 从任务提交响应中解析作业或计划任务
///
/// 识别 `jobIds`、`jobId` 与 `taskId`，都不存在时返回 None。
pub(crate) fn parse_job_submission(value: &Value) -> Option<JobSubmission> {
    if let Some(ids) = value.get("jobIds").and_then(Value::as_array) {
        let jobs: Vec<JobRef> = ids
            .iter()
            .filter_map(|id| match id {
                Value::String(s) => s.parse().ok(),
                other => other.as_i64(),
            })
            .map(JobRef::new)
            .collect();
        return match jobs.len() {
            0 => None,
            1 => Some(JobSubmission::Job(jobs[0])),
            _ => Some(JobSubmission::Jobs(jobs)),
        };
    }
    if let Some(id) = int_field(value, "jobId") {
        return Some(JobSubmission::Job(JobRef::new(id)));
    }
    int_field(value, "taskId").map(JobSubmission::Schedule)
}
