/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
use unitbus::prelude::*;

#[bus_message(command = "command/ping")]
pub struct PingCommand;

#[bus_message(reply = "command/ping/reply")]
pub struct PingReply;

#[bus_message(command = "command/project/create")]
pub struct CreateProject {
    pub name: String,
    pub public: bool,
}

#[bus_message(reply = "command/project/create/reply")]
pub struct CreateProjectReply {
    pub project_id: u64,
}

#[bus_message(event = "event/project/list")]
pub struct ProjectListEvent {
    pub projects: Vec<String>,
}

#[bus_message(event = "event/project/deleted")]
pub struct ProjectDeletedEvent {
    pub project_id: u64,
}

#[bus_message(event = "event/audit/entry")]
pub struct AuditEvent {
    pub entry: String,
}

pub fn register_test_messages(registry: &MessageTypeRegistry) -> Result<(), MessageError> {
    registry.register::<PingCommand>()?;
    registry.register::<PingReply>()?;
    registry.register::<CreateProject>()?;
    registry.register::<CreateProjectReply>()?;
    registry.register::<ProjectListEvent>()?;
    registry.register::<ProjectDeletedEvent>()?;
    registry.register::<AuditEvent>()?;
    Ok(())
}
