//! View components (wasm only).
//!
//! Thin orchestration over the stores: views copy store snapshots into
//! signals, re-rendering on the stores' change callbacks. Navigation is
//! a section switch, not a router.

mod admin;
mod cars;
mod chat;
mod dealership;
mod friends;
mod login;

pub use admin::AdminView;
pub use cars::{BrowseView, FavouritesView};
pub use chat::ChatView;
pub use dealership::DealershipView;
pub use friends::FriendsView;
pub use login::Login;

use dioxus::prelude::*;

use crate::bus::{EventBus, EventKind};
use crate::hub::HubManager;
use crate::platform::callback;
use crate::session::SessionStore;
use crate::stores::{
    AdminStore, CarsStore, CommentsStore, ConversationsStore, DealershipsStore, FavouritesStore,
    FriendsStore,
};

/// Everything the component tree needs, wired once at startup and
/// provided through context.
#[derive(Clone)]
pub struct Services {
    pub bus: EventBus,
    pub session: SessionStore,
    pub hubs: HubManager,
    pub cars: CarsStore,
    pub favourites: FavouritesStore,
    pub comments: CommentsStore,
    pub friends: FriendsStore,
    pub conversations: ConversationsStore,
    pub dealerships: DealershipsStore,
    pub admin: AdminStore,
}

impl Services {
    pub fn new() -> Self {
        let bus = EventBus::new();
        let session = SessionStore::new(bus.clone());
        let hubs = HubManager::new(session.clone());

        let friends = FriendsStore::new(session.clone());
        let conversations = ConversationsStore::new(session.clone());
        hubs.attach_friends(&friends);
        hubs.attach_conversations(&conversations);

        Self {
            cars: CarsStore::new(session.clone()),
            favourites: FavouritesStore::new(session.clone()),
            comments: CommentsStore::new(session.clone()),
            dealerships: DealershipsStore::new(session.clone()),
            admin: AdminStore::new(session.clone()),
            friends,
            conversations,
            hubs,
            session,
            bus,
        }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Browse,
    Favourites,
    Chat,
    Friends,
    Dealership,
    Admin,
}

/// Application root: session gate plus section shell.
#[component]
pub fn App() -> Element {
    let services = use_context_provider(Services::new);

    let auth_tick = use_signal(|| 0u64);
    use_hook({
        let bus = services.bus.clone();
        let hubs = services.hubs.clone();
        let session = services.session.clone();
        move || {
            bus.subscribe(
                EventKind::AuthStateChanged,
                callback(move |_| {
                    let mut tick = auth_tick;
                    tick += 1;
                }),
            );
            if session.is_valid() {
                hubs.start();
            } else if session.read().is_some() {
                // Access token expired but a session is on disk: try a
                // silent resume off the refresh token.
                spawn(async move {
                    session.refresh_session().await;
                });
            }
        }
    });

    let _ = auth_tick();
    let signed_in = services.session.is_valid();

    rsx! {
        if signed_in {
            Shell {}
        } else {
            Login {}
        }
    }
}

#[component]
fn Shell() -> Element {
    let services = use_context::<Services>();
    let mut section = use_signal(|| Section::Browse);

    // Re-render on session changes so the impersonation banner and the
    // admin tab track the active user.
    let auth_tick = use_signal(|| 0u64);
    let subscription = use_hook({
        let bus = services.bus.clone();
        move || {
            bus.subscribe(
                EventKind::AuthStateChanged,
                callback(move |_| {
                    let mut tick = auth_tick;
                    tick += 1;
                }),
            )
        }
    });
    use_drop({
        let bus = services.bus.clone();
        move || bus.unsubscribe(subscription)
    });
    let _ = auth_tick();

    let user = services.session.user();
    let is_admin = user.as_ref().is_some_and(|u| u.is_admin());
    let impersonating = services.session.is_impersonating();

    let tabs: &[(Section, &str)] = &[
        (Section::Browse, "Browse"),
        (Section::Favourites, "Favourites"),
        (Section::Chat, "Chat"),
        (Section::Friends, "Friends"),
        (Section::Dealership, "Dealership"),
    ];

    rsx! {
        div { class: "min-h-screen bg-[#1e1f22] text-white flex flex-col",
            if impersonating {
                div { class: "bg-amber-600 text-black px-4 py-2 flex items-center justify-between",
                    span {
                        "Acting as "
                        strong { {user.as_ref().map(|u| u.display_name()).unwrap_or_default()} }
                    }
                    button {
                        class: "px-3 py-1 bg-black/20 rounded hover:bg-black/40",
                        onclick: {
                            let session = services.session.clone();
                            move |_| {
                                session.end_impersonation();
                            }
                        },
                        "Stop impersonating"
                    }
                }
            }
            header { class: "bg-[#2b2d31] px-6 py-3 flex items-center gap-6",
                h1 { class: "text-lg font-bold", "motorbay" }
                nav { class: "flex gap-2 flex-1",
                    for (target, label) in tabs.iter().copied() {
                        button {
                            class: format!(
                                "px-3 py-1.5 rounded text-sm {}",
                                if *section.read() == target {
                                    "bg-[#404249] text-white"
                                } else {
                                    "text-[#b5bac1] hover:bg-[#35373c]"
                                },
                            ),
                            onclick: move |_| section.set(target),
                            "{label}"
                        }
                    }
                    if is_admin {
                        button {
                            class: format!(
                                "px-3 py-1.5 rounded text-sm {}",
                                if *section.read() == Section::Admin {
                                    "bg-[#404249] text-white"
                                } else {
                                    "text-[#b5bac1] hover:bg-[#35373c]"
                                },
                            ),
                            onclick: move |_| section.set(Section::Admin),
                            "Admin"
                        }
                    }
                }
                button {
                    class: "px-3 py-1.5 rounded text-sm text-[#b5bac1] hover:bg-[#35373c]",
                    onclick: {
                        let services = services.clone();
                        move |_| {
                            services.hubs.shutdown();
                            services.session.clear();
                        }
                    },
                    "Sign out"
                }
            }
            main { class: "flex-1 overflow-y-auto",
                match *section.read() {
                    Section::Browse => rsx! { BrowseView {} },
                    Section::Favourites => rsx! { FavouritesView {} },
                    Section::Chat => rsx! { ChatView {} },
                    Section::Friends => rsx! { FriendsView {} },
                    Section::Dealership => rsx! { DealershipView {} },
                    Section::Admin => rsx! { AdminView {} },
                }
            }
        }
    }
}
