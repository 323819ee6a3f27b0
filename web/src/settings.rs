use serde::{Deserialize, Serialize};
use sumfruit_core as game;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::theme::Theme;
use crate::utils::*;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Settings {
    pub game_config: game::GameConfig,
    pub light_colors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game_config: game::GameConfig::default(),
            light_colors: false,
        }
    }
}

impl StorageKey for Settings {
    const KEY: &'static str = "sumfruit:settings:v1";
}

#[derive(Properties, PartialEq)]
pub(crate) struct SettingsProps {
    #[prop_or_default]
    pub open: bool,
    pub settings: Settings,
    pub onupdate: Callback<Settings>,
    pub onclose: Callback<()>,
}

fn apply_theme(theme: Option<Theme>) -> Callback<MouseEvent> {
    Callback::from(move |e: MouseEvent| {
        e.prevent_default();
        Theme::apply(theme);
    })
}

#[function_component]
pub(crate) fn SettingsView(props: &SettingsProps) -> Html {
    let settings = props.settings;

    let on_light_colors = {
        let onupdate = props.onupdate.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            onupdate.emit(Settings {
                light_colors: input.checked(),
                ..settings
            });
        })
    };

    let on_close = {
        let onclose = props.onclose.clone();
        Callback::from(move |_: MouseEvent| onclose.emit(()))
    };

    html! {
        <dialog id="settings" open={props.open}>
            <article>
                <h2>{"Settings"}</h2>
                <label>
                    <input type="checkbox" checked={settings.light_colors} onchange={on_light_colors}/>
                    {" Light Colors"}
                </label>
                <ul>
                    <li><a href="#" onclick={apply_theme(None)}>{"Auto"}</a></li>
                    <li><a href="#" onclick={apply_theme(Some(Theme::Light))}>{"Light"}</a></li>
                    <li><a href="#" onclick={apply_theme(Some(Theme::Dark))}>{"Dark"}</a></li>
                </ul>
                <footer>
                    <button onclick={on_close}>{"Close"}</button>
                </footer>
            </article>
        </dialog>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_board() {
        let settings = Settings::default();

        assert_eq!(settings.game_config.size, (17, 10));
        assert_eq!(settings.game_config.round_secs, 120);
        assert!(!settings.light_colors);
    }

    #[test]
    fn settings_round_trip_through_serde() {
        let settings = Settings {
            game_config: game::GameConfig::new((9, 6), 60),
            light_colors: true,
        };

        let json = serde_json::to_string(&settings).unwrap();
        let restored: Settings = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, settings);
    }

    #[test]
    fn storage_key_is_versioned() {
        assert_eq!(<Settings as StorageKey>::KEY, "sumfruit:settings:v1");
    }
}
