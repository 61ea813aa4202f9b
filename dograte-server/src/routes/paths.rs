//! Absolute request paths for every versioned endpoint.

macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub const LOGIN: &str = v1_path!("/login");
    pub const LOGOUT: &str = v1_path!("/logout");

    pub mod users {
        pub const REGISTER: &str = v1_path!("/users/register");
        pub const CURRENT: &str = v1_path!("/users/me");

        pub mod admin {
            pub const ALL: &str = v1_path!("/users/admin/all");
            pub const DELETE_USER: &str = v1_path!("/users/admin/deleteuser");
        }
    }

    pub mod dogs {
        pub const RATE: &str = v1_path!("/dogs");
        pub const RATING: &str = v1_path!("/dogs/rating");
        pub const URL: &str = v1_path!("/dogs/url");
        pub const ALL: &str = v1_path!("/dogs/all");
        pub const ALL_MORE: &str = v1_path!("/dogs/all/more");
        pub const ALL_SORTED: &str = v1_path!("/dogs/all/sorted");
        pub const MAX_COUNT: &str = v1_path!("/dogs/maxcount");
        pub const FILTERED_MAX_COUNT: &str = v1_path!("/dogs/filtered/maxcount");
        pub const TABLE: &str = v1_path!("/dogs/table");
        pub const RANDOM: &str = v1_path!("/dogs/random");
        pub const BREED: &str = v1_path!("/dogs/breed");
        pub const FAVOURITES: &str = v1_path!("/dogs/favourites");

        pub mod user {
            pub const SORTED: &str = v1_path!("/dogs/user");
            pub const MAX_COUNT: &str = v1_path!("/dogs/user/maxcount");
            pub const FILTERED_MAX_COUNT: &str =
                v1_path!("/dogs/user/filtered/maxcount");
            pub const TABLE: &str = v1_path!("/dogs/user/table");
        }

        pub mod admin {
            pub const STORE_ALL_BREEDS: &str =
                v1_path!("/dogs/admin/storeallbreeds");
        }
    }
}

/// Strips the version root so a nested router can register the path.
pub fn relative(path: &'static str) -> &'static str {
    path.strip_prefix(v1::ROOT).unwrap_or(path)
}
