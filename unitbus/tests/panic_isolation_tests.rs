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

//! Panicking handlers and callbacks run under plain `#[tokio::test]` in their own
//! binary so no test panic hook observes the contained panics.

use std::sync::Arc;

use parking_lot::Mutex;
use unitbus::prelude::*;

use crate::setup::messages::{PingCommand, PingReply};
use crate::setup::test_bus;

mod setup;

fn pong_service() -> MessageService {
    MessageService::new("ping").on::<PingCommand>(|_, context| {
        context.reply(PingReply, true, "PONG")?;
        Ok(())
    })
}

#[tokio::test]
async fn panicking_handler_is_isolated() -> anyhow::Result<()> {
    let bus = test_bus("ping")?;
    let later_ran = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&later_ran);
    bus.add_service(MessageService::new("broken").on::<PingCommand>(|_, _| {
        panic!("handler exploded");
    }));
    bus.add_service(MessageService::new("healthy").on::<PingCommand>(move |_, _| {
        *flag.lock() = true;
        Ok(())
    }));
    let failed = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&failed);

    bus.builder()
        .build_command(PingCommand)
        .timeout(5)
        .failed(move |fail_type, message| seen.lock().push((fail_type, message.to_string())))
        .emit(Channel::Local)?;

    assert!(*later_ran.lock());
    let failed = failed.lock();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, CommandFailType::Exception);
    assert!(failed[0].1.contains("handler exploded"));
    assert_eq!(bus.stats().handler_invocations(), 2);
    assert_eq!(bus.stats().handler_errors(), 1);
    drop(failed);

    bus.process();
    bus.remove_service("broken");
    bus.add_service(pong_service());
    let answered = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&answered);
    bus.builder()
        .build_command(PingCommand)
        .timeout(5)
        .done(move |_, success, _| *flag.lock() = success)
        .emit(Channel::Local)?;
    bus.process();

    assert!(*answered.lock());
    assert_eq!(bus.command_dispatcher().in_flight(), 0);
    Ok(())
}

#[tokio::test]
async fn handler_panicking_after_its_reply_resolves_with_the_reply() -> anyhow::Result<()> {
    let bus = test_bus("ping")?;
    bus.add_service(MessageService::new("ping").on::<PingCommand>(|_, context| {
        context.reply(PingReply, true, "PONG")?;
        panic!("handler exploded after replying");
    }));
    let outcome = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::clone(&outcome);
    let failed = Arc::clone(&outcome);

    bus.builder()
        .build_command(PingCommand)
        .timeout(5)
        .done(move |_, success, message| done.lock().push(format!("done:{success}:{message}")))
        .failed(move |fail_type, _| failed.lock().push(format!("failed:{fail_type}")))
        .emit(Channel::Local)?;

    assert_eq!(*outcome.lock(), vec!["done:true:PONG".to_string()]);
    assert_eq!(bus.stats().handler_errors(), 1);
    Ok(())
}

#[tokio::test]
async fn panicking_callback_does_not_stop_other_callbacks() -> anyhow::Result<()> {
    let bus = test_bus("ping")?;
    bus.add_service(pong_service());
    let calls = Arc::new(Mutex::new(0_usize));
    let seen = Arc::clone(&calls);

    bus.builder()
        .build_command(PingCommand)
        .timeout(0)
        .done(|_, _, _| panic!("callback exploded"))
        .done(move |_, _, _| *seen.lock() += 1)
        .emit(Channel::Local)?;

    assert_eq!(*calls.lock(), 1);
    Ok(())
}

#[tokio::test]
async fn panicking_event_handler_does_not_stop_delivery() -> anyhow::Result<()> {
    let bus = test_bus("audit")?;
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&delivered);
    bus.add_service(
        MessageService::new("audit")
            .on::<crate::setup::messages::AuditEvent>(|event, _| {
                if event.entry == "boom" {
                    panic!("cannot audit");
                }
                Ok(())
            })
            .on::<crate::setup::messages::AuditEvent>(move |event, _| {
                seen.lock().push(event.entry.clone());
                Ok(())
            }),
    );

    for entry in ["first", "boom", "last"] {
        bus.builder()
            .build_event(crate::setup::messages::AuditEvent {
                entry: entry.to_string(),
            })
            .emit(Channel::Local)?;
    }

    assert_eq!(*delivered.lock(), vec!["first", "boom", "last"]);
    assert_eq!(bus.stats().handler_errors(), 1);
    Ok(())
}
