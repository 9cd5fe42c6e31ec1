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
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use unitbus::prelude::*;
use unitbus_test::prelude::*;

use crate::setup::messages::{AuditEvent, CreateProject, CreateProjectReply, ProjectListEvent};
use crate::setup::test_bus;

mod setup;

fn capture<M: BusMessage>(bus: &MessageBus) -> Arc<Mutex<Vec<Message>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    bus.add_service(MessageService::new("capture").on::<M>(move |_, context| {
        log.lock().push(context.message().clone());
        Ok(())
    }));
    seen
}

#[unitbus_test]
async fn emitted_messages_are_stamped_with_the_component() -> anyhow::Result<()> {
    let bus = test_bus("front")?;
    let seen = capture::<AuditEvent>(&bus);

    let emitted = bus
        .builder()
        .build_event(AuditEvent {
            entry: "login".to_string(),
        })
        .emit(Channel::Local)?;

    let me = UnitId::new("component", "front");
    assert_eq!(emitted.origin(), &me);
    assert_eq!(emitted.sender(), &me);
    assert_eq!(emitted.hops(), &[me][..]);
    assert_eq!(emitted.category(), MessageCategory::Event);
    assert!(emitted.unique().is_none());
    assert!(emitted.trace().starts_with("trace_"));

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].trace(), emitted.trace());
    assert_eq!(
        seen[0].body_as::<AuditEvent>().map(|event| event.entry.as_str()),
        Some("login")
    );
    Ok(())
}

#[unitbus_test]
async fn every_command_gets_a_fresh_unique() -> anyhow::Result<()> {
    let bus = test_bus("front")?;
    let create = || CreateProject {
        name: "alpha".to_string(),
        public: false,
    };

    let first = bus.builder().build_command(create()).timeout(0).emit(Channel::Local)?;
    let second = bus.builder().build_command(create()).timeout(0).emit(Channel::Local)?;

    assert!(first.unique().is_some());
    assert_ne!(first.unique(), second.unique());
    assert_ne!(first.trace(), second.trace());
    Ok(())
}

#[unitbus_test]
async fn field_overrides_replace_body_fields() -> anyhow::Result<()> {
    let bus = test_bus("front")?;
    let seen = capture::<ProjectListEvent>(&bus);

    bus.builder()
        .build_event(ProjectListEvent { projects: Vec::new() })
        .with_field("projects", json!(["alpha", "beta"]))
        .emit(Channel::Local)?;

    let seen = seen.lock();
    let body = seen[0]
        .body_as::<ProjectListEvent>()
        .expect("body keeps its type");
    assert_eq!(body.projects, vec!["alpha", "beta"]);
    Ok(())
}

#[unitbus_test]
async fn unknown_field_override_aborts_the_emit() -> anyhow::Result<()> {
    let bus = test_bus("front")?;
    let seen = capture::<ProjectListEvent>(&bus);

    let result = bus
        .builder()
        .build_event(ProjectListEvent { projects: Vec::new() })
        .with_field("owner", json!("alice"))
        .emit(Channel::Local);

    assert!(matches!(
        result,
        Err(MessageError::UnknownField { ref message, ref field })
            if message == "event/project/list" && field == "owner"
    ));
    assert!(seen.lock().is_empty());
    assert_eq!(bus.stats().dispatched(), 0);
    Ok(())
}

#[unitbus_test]
async fn payload_and_before_callbacks_apply_in_order() -> anyhow::Result<()> {
    let bus = test_bus("front")?;
    let seen = capture::<AuditEvent>(&bus);

    bus.builder()
        .build_event(AuditEvent {
            entry: "upload".to_string(),
        })
        .payload("file", vec![0xde_u8, 0xad, 0xbe, 0xef])
        .payload("meta", json!({ "size": 4 }))
        .before(|message, _| {
            message.payload_mut().insert("meta", json!({ "size": 4, "checked": true }));
        })
        .before(|message, meta| {
            assert_eq!(meta.category(), MessageCategory::Event);
            if let Some(body) = message.body_as_mut::<AuditEvent>() {
                body.entry.push_str(" (verified)");
            }
        })
        .emit(Channel::Local)?;

    let seen = seen.lock();
    let message = &seen[0];
    assert_eq!(message.payload().binary("file"), Some(&[0xde_u8, 0xad, 0xbe, 0xef][..]));
    assert_eq!(
        message.payload().get("meta"),
        Some(&PayloadEntry::Json(json!({ "size": 4, "checked": true })))
    );
    assert_eq!(
        message.body_as::<AuditEvent>().map(|event| event.entry.as_str()),
        Some("upload (verified)")
    );
    Ok(())
}

#[unitbus_test]
async fn chained_messages_keep_the_trace() -> anyhow::Result<()> {
    let bus = test_bus("front")?;
    let command = bus
        .builder()
        .build_command(CreateProject {
            name: "alpha".to_string(),
            public: true,
        })
        .timeout(0)
        .emit(Channel::Local)?;

    let event = bus
        .builder()
        .build_event(AuditEvent {
            entry: "created".to_string(),
        })
        .chain(&command)
        .emit(Channel::Local)?;

    assert_eq!(event.trace(), command.trace());
    assert_eq!(event.hops(), command.hops());
    Ok(())
}

#[unitbus_test]
async fn builder_counts_composers_per_category() -> anyhow::Result<()> {
    let bus = test_bus("front")?;
    let builder = bus.builder();

    let command = builder
        .build_command(CreateProject {
            name: "alpha".to_string(),
            public: true,
        })
        .timeout(0)
        .emit(Channel::Local)?;
    builder
        .build_command_reply(&command, CreateProjectReply { project_id: 1 }, true, "created")?
        .emit()?;
    let _unemitted = builder.build_event(AuditEvent {
        entry: "never sent".to_string(),
    });

    assert_eq!(builder.emitted(MessageCategory::Command), 1);
    assert_eq!(builder.emitted(MessageCategory::CommandReply), 1);
    assert_eq!(builder.emitted(MessageCategory::Event), 1);
    assert_eq!(bus.builder().emitted(MessageCategory::Event), 0);
    assert_eq!(builder.submitted(MessageCategory::Command), 1);
    assert_eq!(builder.submitted(MessageCategory::CommandReply), 1);
    assert_eq!(builder.submitted(MessageCategory::Event), 0);
    Ok(())
}

#[unitbus_test]
async fn replies_that_fail_to_emit_are_not_counted() -> anyhow::Result<()> {
    let bus = test_bus("front")?;
    let seen = Arc::new(Mutex::new(None));
    let log = Arc::clone(&seen);
    bus.add_service(MessageService::new("projects").on::<CreateProject>(move |_, context| {
        let emitter = context.emitter();
        let _dropped = emitter.build_command_reply(
            context.message(),
            CreateProjectReply { project_id: 1 },
            true,
            "created",
        )?;
        let rejected = emitter
            .build_command_reply(context.message(), CreateProjectReply { project_id: 2 }, true, "created")?
            .with_field("owner", json!("alice"))
            .emit();
        *log.lock() = Some((
            rejected.is_err(),
            emitter.builder().emitted(MessageCategory::CommandReply),
            emitter.replies_emitted(),
        ));
        Ok(())
    }));

    bus.builder()
        .build_command(CreateProject {
            name: "alpha".to_string(),
            public: false,
        })
        .timeout(0)
        .emit(Channel::Local)?;

    assert_eq!(*seen.lock(), Some((true, 2, 0)));
    Ok(())
}

#[unitbus_test]
async fn handler_context_exposes_identity_and_configuration() -> anyhow::Result<()> {
    let bus = test_bus("front")?;
    let seen = Arc::new(Mutex::new(None));
    let log = Arc::clone(&seen);
    bus.add_service(MessageService::new("inspector").on::<AuditEvent>(move |_, context| {
        *log.lock() = Some((
            context.component_id().to_string(),
            context.service().to_string(),
            context.entrypoint(),
            context.config().messaging.command_timeout_secs,
        ));
        Ok(())
    }));

    bus.builder()
        .build_event(AuditEvent {
            entry: "login".to_string(),
        })
        .emit(Channel::Local)?;

    assert_eq!(
        *seen.lock(),
        Some((
            "component/front".to_string(),
            "inspector".to_string(),
            MessageEntrypoint::Local,
            30
        ))
    );
    Ok(())
}
