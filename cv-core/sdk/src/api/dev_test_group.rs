//! 开发测试组 API
//!
//! 通过 CreateLab 工作流为 vApp 置备开发测试虚拟机。

use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

use crate::api::job::parse_job_submission;
use crate::client::Commcell;
use crate::error::{ErrorModule, Result, SdkError};
use crate::models::JobSubmission;
use crate::response::str_field;
use crate::services::Service;
use crate::wrap::WrapOptions;

/// 开发测试组 API
pub struct DevTestGroupApi<'a> {
    commcell: &'a Commcell,
}

impl<'a> DevTestGroupApi<'a> {
    pub(crate) fn new(commcell: &'a Commcell) -> Self {
        Self { commcell }
    }

    /// 提交 vApp 的开发测试实验室置备任务
    ///
    /// # Arguments
    /// * `vapp_prop` - vApp 实体，作为任务关联与置备目标
    pub async fn dev_test_lab(&self, vapp_prop: Value) -> Result<JobSubmission> {
        info!("提交开发测试实验室置备任务");
        let value = self
            .commcell
            .wrap_request(
                Method::POST,
                Service::Restore,
                &[],
                WrapOptions::new()
                    .payload(lab_request(vapp_prop))
                    .error_check(false),
            )
            .await?;
        submission_from(&value)
    }
}

fn lab_request(vapp_prop: Value) -> Value {
    json!({
        "taskInfo": {
            "associations": [vapp_prop],
            "task": {
                "initiatedFrom": 1,
                "taskType": 1,
                "policyType": 0,
                "taskFlags": {"disabled": false},
            },
            "subTasks": [{
                "subTaskOperation": 1,
                "subTask": {"subTaskType": 1, "operationType": 4038},
                "options": {
                    "adminOpts": {
                        "vmProvisioningOption": {
                            "invokeWorkflowperJob": true,
                            "operationType": 23,
                            "workflow": {"workflowName": "CreateLab"},
                            "virtualMachineOption": [{
                                "powerOnVM": true,
                                "useLinkedClone": false,
                                "restoreAsManagedVM": false,
                                "doLinkedCloneFromLocalTemplateCopy": false,
                            }],
                            "vAppEntity": vapp_prop,
                        }
                    }
                }
            }]
        }
    })
}

fn submission_from(value: &Value) -> Result<JobSubmission> {
    if let Some(submission) = parse_job_submission(value) {
        return Ok(submission);
    }
    let message = match value.get("errorCode") {
        Some(_) => format!(
            "Virtual Machine Management job failed\nError: \"{}\"",
            str_field(value, "errorMessage").unwrap_or_default()
        ),
        None => "Failed to run Virtual Machine Management job".to_string(),
    };
    Err(SdkError::with_message(ErrorModule::Subclient, 102, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobRef;

    #[test]
    fn test_lab_request() {
        let vapp = json!({"vAppName": "lab01", "vAppId": 3});
        let body = lab_request(vapp.clone());
        let option = &body["taskInfo"]["subTasks"][0]["options"]["adminOpts"]["vmProvisioningOption"];
        assert_eq!(body["taskInfo"]["associations"][0], vapp);
        assert_eq!(option["workflow"]["workflowName"], "CreateLab");
        assert_eq!(option["operationType"], 23);
        assert_eq!(option["vAppEntity"], vapp);
        assert_eq!(body["taskInfo"]["subTasks"][0]["subTask"]["operationType"], 4038);
    }

    #[test]
    fn test_submission_from() {
        assert_eq!(
            submission_from(&json!({"jobIds": ["9"]})).unwrap(),
            JobSubmission::Job(JobRef::new(9))
        );
        let err = submission_from(&json!({"errorCode": 5, "errorMessage": "no vApp"})).unwrap_err();
        assert!(err.is(ErrorModule::Subclient, 102));
        assert!(err.message().ends_with("Error: \"no vApp\""));

        let err = submission_from(&json!({"other": 1})).unwrap_err();
        assert_eq!(err.message(), "Failed to run Virtual Machine Management job");
    }
}
