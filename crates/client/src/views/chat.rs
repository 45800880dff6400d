//! Direct messaging: conversation list, thread, composer.

use dioxus::prelude::*;

use super::Services;
use crate::platform::task;

#[component]
pub fn ChatView() -> Element {
    let services = use_context::<Services>();
    let mut version = use_signal(|| 0u64);
    let mut selected = use_signal(|| None::<String>);
    let mut draft = use_signal(String::new);
    let mut send_error = use_signal(|| None::<String>);

    use_hook({
        let conversations = services.conversations.clone();
        move || {
            // Realtime reconciliation lands here; bump to re-render.
            conversations.on_change(task(move || {
                let mut tick = version;
                tick += 1;
            }));
            let conversations = conversations.clone();
            spawn(async move {
                conversations.refresh().await;
            });
        }
    });
    use_drop({
        let conversations = services.conversations.clone();
        move || conversations.clear_on_change()
    });

    let open_thread = {
        let services = services.clone();
        move |user_id: String| {
            selected.set(Some(user_id.clone()));
            let conversations = services.conversations.clone();
            let hubs = services.hubs.clone();
            let me = services.session.user().map(|u| u.id).unwrap_or_default();
            spawn(async move {
                conversations.load_thread(&user_id).await;
                // Mark everything the counterpart sent as read.
                for message in conversations.thread(&user_id) {
                    if message.receiver_id == me && message.read_at.is_none() {
                        let _ = hubs.mark_as_read(&message.id);
                        conversations.apply_read(&message.id);
                    }
                }
            });
        }
    };

    let send = {
        let services = services.clone();
        move |_| {
            let Some(receiver) = selected.read().clone() else {
                return;
            };
            let content = draft.read().trim().to_string();
            if content.is_empty() {
                return;
            }
            // Fail-fast send: when the hub is offline the message is
            // not queued and the user is told right away.
            match services.hubs.send_message(&receiver, &content) {
                Ok(()) => {
                    draft.set(String::new());
                    send_error.set(None);
                }
                Err(e) => {
                    send_error.set(Some(format!(
                        "Message not sent ({e}). Check your connection and try again."
                    )));
                }
            }
        }
    };

    let _ = version();
    let conversations = services.conversations.conversations();
    let me = services.session.user().map(|u| u.id).unwrap_or_default();
    let thread = selected
        .read()
        .as_ref()
        .map(|id| services.conversations.thread(id))
        .unwrap_or_default();

    rsx! {
        div { class: "flex h-full",
            aside { class: "w-72 bg-[#2b2d31] overflow-y-auto",
                h2 { class: "px-4 py-3 text-xs font-bold uppercase text-[#949ba4]",
                    "Conversations"
                }
                if conversations.is_empty() {
                    p { class: "px-4 text-sm text-[#949ba4]", "No conversations yet." }
                }
                for convo in conversations.iter() {
                    div {
                        key: "{convo.user.id}",
                        class: format!(
                            "px-4 py-3 cursor-pointer {}",
                            if selected.read().as_deref() == Some(convo.user.id.as_str()) {
                                "bg-[#404249]"
                            } else {
                                "hover:bg-[#35373c]"
                            },
                        ),
                        onclick: {
                            let open_thread = open_thread.clone();
                            let user_id = convo.user.id.clone();
                            move |_| open_thread(user_id.clone())
                        },
                        div { class: "flex items-center justify-between",
                            span { class: "text-white text-sm font-medium",
                                "{convo.user.first_name} {convo.user.last_name}"
                            }
                            if convo.unread_count > 0 {
                                span { class: "bg-indigo-500 text-white text-xs rounded-full px-2 py-0.5",
                                    "{convo.unread_count}"
                                }
                            }
                        }
                        p { class: "text-xs text-[#949ba4] truncate", "{convo.last_message.content}" }
                    }
                }
            }
            section { class: "flex-1 flex flex-col",
                div { class: "flex-1 overflow-y-auto p-4 space-y-2",
                    if selected.read().is_none() {
                        p { class: "text-[#949ba4]", "Pick a conversation to start chatting." }
                    }
                    for message in thread.iter() {
                        div {
                            key: "{message.id}",
                            class: format!(
                                "max-w-md rounded-lg px-3 py-2 text-sm {}",
                                if message.sender_id == me {
                                    "ml-auto bg-indigo-500 text-white"
                                } else {
                                    "bg-[#2b2d31] text-[#dbdee1]"
                                },
                            ),
                            "{message.content}"
                        }
                    }
                }
                if let Some(err) = send_error.read().as_ref() {
                    div { class: "mx-4 mb-2 p-2 bg-red-500/10 border border-red-500/30 rounded text-red-400 text-sm",
                        "{err}"
                    }
                }
                if selected.read().is_some() {
                    div { class: "p-4 flex gap-2",
                        input {
                            class: "flex-1 bg-[#1e1f22] rounded p-2.5 text-white placeholder-[#949ba4]",
                            placeholder: "Write a message...",
                            value: "{draft}",
                            oninput: move |e: FormEvent| {
                                draft.set(e.value());
                                send_error.set(None);
                            },
                        }
                        button {
                            class: "px-4 py-2 bg-indigo-500 hover:bg-indigo-600 rounded text-white",
                            onclick: send,
                            "Send"
                        }
                    }
                }
            }
        }
    }
}
