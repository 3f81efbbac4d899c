//! The pie chart on the summary page.
//!
//! Charts are ECharts options built with charming and serialized to JSON,
//! then initialized by a small script in the page head.

use charming::{
    Chart,
    component::Legend,
    element::{JsFunction, Tooltip, Trigger},
    series::Pie,
};
use maud::{Markup, PreEscaped, html};

use crate::{html::HeadElement, summary::aggregation::CategoryTotal};

/// A chart with its HTML container ID and ECharts configuration.
pub(super) struct SummaryChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for the charts.
pub(super) fn charts_view(charts: &[SummaryChart]) -> Markup {
    html!(
        section id="charts" class="w-full mx-auto"
        {
            @for chart in charts {
                div
                    id=(chart.id)
                    class="min-h-[320px] rounded dark:bg-gray-100"
                {}
            }
        }
    )
}

/// Generates JavaScript initialization code for the charts.
///
/// Charts follow the browser's dark mode setting and resize with the window.
pub(super) fn charts_script(charts: &[SummaryChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// A donut chart of how much was spent on each category.
pub(super) fn category_chart(breakdown: &[CategoryTotal]) -> Chart {
    let data: Vec<(f64, String)> = breakdown
        .iter()
        .map(|item| (item.amount, item.category.to_string()))
        .collect();

    Chart::new()
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("0%"))
        .series(
            Pie::new()
                .name("Spending by category")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-IN', {
              style: 'currency',
              currency: 'INR'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

#[cfg(test)]
mod chart_tests {
    use crate::{expense::Category, summary::aggregation::CategoryTotal};

    use super::{SummaryChart, category_chart, charts_script};
    use crate::html::HeadElement;

    #[test]
    fn chart_options_include_each_category() {
        let breakdown = [
            CategoryTotal {
                category: Category::Rent,
                amount: 500.0,
                percentage: 80.0,
            },
            CategoryTotal {
                category: Category::Food,
                amount: 125.0,
                percentage: 20.0,
            },
        ];

        let options = category_chart(&breakdown).to_string();

        assert!(options.contains("\"pie\""), "got options {options}");
        assert!(options.contains("Rent"));
        assert!(options.contains("Food"));
    }

    #[test]
    fn script_initializes_each_chart() {
        let charts = [SummaryChart {
            id: "category-chart",
            options: "{}".to_owned(),
        }];

        let HeadElement::ScriptSource(script) = charts_script(&charts) else {
            panic!("want a script source head element");
        };

        assert!(script.0.contains("document.getElementById(\"category-chart\")"));
        assert!(script.0.contains("DOMContentLoaded"));
    }
}
