//! ECS resource block derivation.

use crate::spec::{LogTarget, NormalizedApp, ResourceBlock};

pub fn assemble(team: &str, app: &NormalizedApp, region: &str) -> ResourceBlock {
    ResourceBlock {
        task_definition: format!("{}-{}-task", team, app.id),
        cpu: app.cpu_request.to_string(),
        memory: app.memory_request.to_string(),
        enable_execute_command: true,
        log: LogTarget {
            driver: "awslogs".to_string(),
            group: format!("/ecs/{}/{}", team, app.id),
            region: region.to_string(),
            stream_prefix: "ecs".to_string(),
        },
    }
}
