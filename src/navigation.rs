//! The header and the tab bar shown on every page after sign in.
//!
//! On phones the tabs sit in a bar fixed to the bottom of the screen so they
//! are in reach of the user's thumb. From the `lg` breakpoint up they move
//! into the header.

use maud::{Markup, html};

use crate::endpoints;

/// The pages reachable from the tab bar, in display order.
const TABS: [(&str, &str); 3] = [
    (endpoints::HOME_VIEW, "Home"),
    (endpoints::ADD_EXPENSE_VIEW, "Add"),
    (endpoints::SUMMARY_VIEW, "Summary"),
];

const HEADER_TAB_STYLE: &str = "py-2 px-3 rounded-sm text-gray-900 hover:text-blue-700 \
    dark:text-white dark:hover:text-blue-500";
const HEADER_TAB_CURRENT_STYLE: &str = "py-2 px-3 rounded-sm font-semibold text-blue-700 \
    dark:text-blue-500";

const BOTTOM_TAB_STYLE: &str = "flex w-full items-center justify-center rounded-lg \
    px-3 py-2 text-sm font-semibold text-gray-600 hover:bg-blue-50/70 \
    hover:text-blue-700 dark:text-gray-300 dark:hover:bg-blue-900/20";
const BOTTOM_TAB_CURRENT_STYLE: &str = "flex w-full items-center justify-center rounded-lg \
    px-3 py-2 text-sm font-semibold bg-blue-50 text-blue-700 shadow-sm \
    dark:bg-blue-900/30 dark:text-blue-200";

/// Navigation for the signed-in pages.
pub struct NavBar<'a> {
    active_endpoint: &'a str,
}

impl NavBar<'_> {
    /// Create the navigation with the tab for `active_endpoint` highlighted.
    ///
    /// Pages without a tab, e.g. the form for a new automatic expense, leave
    /// every tab unhighlighted.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        NavBar { active_endpoint }
    }

    fn is_current(&self, url: &str) -> bool {
        self.active_endpoint == url
    }

    fn header_tab(&self, url: &str, title: &str) -> Markup {
        let style = if self.is_current(url) {
            HEADER_TAB_CURRENT_STYLE
        } else {
            HEADER_TAB_STYLE
        };

        html!( a href=(url) class=(style) { (title) } )
    }

    fn bottom_tab(&self, url: &str, title: &str) -> Markup {
        let is_current = self.is_current(url);
        let style = if is_current {
            BOTTOM_TAB_CURRENT_STYLE
        } else {
            BOTTOM_TAB_STYLE
        };

        html!(
            a href=(url) class=(style) aria-current=[is_current.then_some("page")]
            {
                (title)
            }
        )
    }

    pub fn into_html(self) -> Markup {
        html!(
            header class="bg-white border-b border-gray-200 dark:bg-gray-900 dark:border-gray-700"
            {
                div class="max-w-screen-xl mx-auto flex items-center justify-between p-4"
                {
                    a href=(endpoints::HOME_VIEW) class="flex items-center gap-3"
                    {
                        img src="/static/favicon-128x128.png" alt="Spendwise Logo" class="h-8";
                        span class="text-2xl font-semibold dark:text-white" { "Spendwise" }
                    }

                    div class="flex items-center gap-6"
                    {
                        nav class="hidden lg:flex gap-4" aria-label="Pages"
                        {
                            @for (url, title) in TABS {
                                (self.header_tab(url, title))
                            }
                        }

                        a
                            href=(endpoints::SIGN_OUT)
                            class="text-sm font-medium text-gray-600 hover:text-blue-700 dark:text-gray-300"
                        {
                            "Sign out"
                        }
                    }
                }
            }

            nav
                id="tab-bar"
                class="fixed inset-x-0 bottom-0 z-40 lg:hidden px-4 pb-4"
                aria-label="Primary"
            {
                ul
                    class="grid grid-cols-3 gap-2 p-3 rounded-xl border border-gray-200
                    bg-white/95 shadow-lg backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                {
                    @for (url, title) in TABS {
                        li { (self.bottom_tab(url, title)) }
                    }
                }
            }
        )
    }
}
