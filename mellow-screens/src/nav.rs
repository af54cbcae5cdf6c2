//! Navigation destinations.
//!
//! A closed set of screens with typed payloads. Parameterized destinations
//! carry their arguments as enum data rather than encoding them into route
//! strings.

/// Every navigable screen in the app.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    Search,
    Library,
    Favorites,
    Profile,
    Settings,
    /// The full-screen now-playing view
    Player,
    /// One playlist's detail view
    Playlist { id: String },
    /// All songs by one artist
    Artist { name: String },
    /// All songs on one album
    Album { name: String },
}

impl Screen {
    /// Human-readable title for the screen.
    pub fn title(&self) -> &str {
        match self {
            Screen::Home => "Home",
            Screen::Search => "Search",
            Screen::Library => "Library",
            Screen::Favorites => "Favorites",
            Screen::Profile => "Profile",
            Screen::Settings => "Settings",
            Screen::Player => "Now Playing",
            Screen::Playlist { .. } => "Playlist",
            Screen::Artist { name } => name,
            Screen::Album { name } => name,
        }
    }

    /// The screens shown in the bottom navigation bar, in order.
    pub fn bottom_nav_items() -> Vec<Screen> {
        vec![
            Screen::Home,
            Screen::Search,
            Screen::Library,
            Screen::Favorites,
            Screen::Profile,
        ]
    }

    /// Whether this screen appears in the bottom navigation bar.
    pub fn is_bottom_nav(&self) -> bool {
        Self::bottom_nav_items().contains(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        assert_eq!(Screen::Home.title(), "Home");
        assert_eq!(Screen::Player.title(), "Now Playing");
        assert_eq!(
            Screen::Artist {
                name: "Golden Hour".to_string()
            }
            .title(),
            "Golden Hour"
        );
    }

    #[test]
    fn test_bottom_nav_membership() {
        assert!(Screen::Home.is_bottom_nav());
        assert!(!Screen::Settings.is_bottom_nav());
        assert!(!Screen::Playlist {
            id: "favorites".to_string()
        }
        .is_bottom_nav());
        assert_eq!(Screen::bottom_nav_items().len(), 5);
    }

    #[test]
    fn test_payload_equality() {
        let a = Screen::Playlist {
            id: "p1".to_string(),
        };
        let b = Screen::Playlist {
            id: "p1".to_string(),
        };
        let c = Screen::Playlist {
            id: "p2".to_string(),
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
